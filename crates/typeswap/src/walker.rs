//! Target-file discovery.
//!
//! `Files` and `ExcludeFile` values are shell-style globs (`*` and `?`
//! wildcards); each is translated into an anchored regular expression and
//! compiled once for the run. Folders are walked recursively, each
//! folder's matches are reported in sorted path order, and a file reached
//! through more than one configured folder is processed only once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::errors::ValidationError;

/// A set of filename globs compiled for repeated matching.
#[derive(Debug, Default)]
pub struct GlobSet {
    patterns: Vec<Regex>,
}

impl GlobSet {
    /// Compile `patterns` into a set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BadPattern`] when a translated pattern
    /// fails to compile.
    pub fn compile(patterns: &[String]) -> Result<Self, ValidationError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(&glob_regex_source(pattern)).map_err(|error| {
                ValidationError::BadPattern {
                    pattern: pattern.clone(),
                    error,
                }
            })?;
            compiled.push(regex);
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether any pattern matches `candidate` in full.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(candidate))
    }

    /// Whether the set holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translate a glob into an anchored regular expression source.
fn glob_regex_source(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() * 2 + 2);
    source.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                if !literal.is_empty() {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                }
                source.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        source.push_str(&regex::escape(&literal));
    }
    source.push('$');
    source
}

/// Walk `folders` and collect the files selected by `include` minus
/// `exclude`.
///
/// Exclusions match against the file name and against the path relative
/// to the folder being walked, so `*_gen.h` and `legacy/*` both work.
/// Unreadable directory entries are skipped.
#[must_use]
pub fn discover_files(folders: &[String], include: &GlobSet, exclude: &GlobSet) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for folder in folders {
        let root = Path::new(folder);
        let mut batch: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy();
                if !include.matches(&name) || exclude.matches(&name) {
                    return false;
                }
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                !exclude.matches(&relative.to_string_lossy())
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        batch.sort();
        for path in batch {
            if seen.insert(path.clone()) {
                targets.push(path);
            }
        }
    }
    log::debug!("discovered {} file(s) under {} folder(s)", targets.len(), folders.len());
    targets
}
