//! End-to-end runs over a parsed configuration.
//!
//! A [`Session`] validates the configuration, compiles the file globs and
//! discovers the target files once; preview, apply and pointer runs all
//! work from the same session. Scanning a file and rewriting it share one
//! pass, so what a preview prints is exactly what an apply writes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::{self, Span};
use crate::errors::{FileError, ValidationError};
use crate::rules::RuleSet;
use crate::scanner;
use crate::walker::{self, GlobSet};

/// A validated run: configuration values, compiled rules and the files
/// they will be applied to.
#[derive(Debug)]
pub struct Session {
    folders: Vec<String>,
    file_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    headings: Vec<String>,
    rules: RuleSet,
    targets: Vec<PathBuf>,
}

impl Session {
    /// Validate `config`, compile its globs and discover the target files.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: no `Folder` values, no `Files`
    /// values, an empty rule set, search folders that do not exist (all
    /// of them are reported together), or a glob that fails to compile.
    pub fn prepare(config: &Config, rules: RuleSet) -> Result<Self, ValidationError> {
        let folders = config.folders();
        if folders.is_empty() {
            return Err(ValidationError::NoFolders);
        }
        let file_patterns = config.file_patterns();
        if file_patterns.is_empty() {
            return Err(ValidationError::NoFilePatterns);
        }
        if rules.is_empty() {
            return Err(ValidationError::NoRules);
        }
        let missing: Vec<String> = folders
            .iter()
            .filter(|folder| !Path::new(folder).is_dir())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFolders { paths: missing });
        }
        let include = GlobSet::compile(&file_patterns)?;
        let exclude_patterns = config.exclude_patterns();
        let exclude = GlobSet::compile(&exclude_patterns)?;
        let targets = walker::discover_files(&folders, &include, &exclude);
        log::debug!("session prepared with {} rule(s), {} target(s)", rules.len(), targets.len());
        Ok(Self {
            folders,
            file_patterns,
            exclude_patterns,
            headings: config.exclude_headings(),
            rules,
            targets,
        })
    }

    /// Folders being searched.
    #[must_use]
    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Globs selecting files.
    #[must_use]
    pub fn file_patterns(&self) -> &[String] {
        &self.file_patterns
    }

    /// Globs excluding files.
    #[must_use]
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// Heading markers that cut substitution off.
    #[must_use]
    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    /// The compiled rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Discovered target files, deduplicated, in per-folder sorted order.
    #[must_use]
    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// Check a one-based file index against the discovered targets.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FileIndexOutOfRange`] when `index` is
    /// zero or past the end of the target list.
    pub fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index == 0 || index > self.targets.len() {
            return Err(ValidationError::FileIndexOutOfRange {
                index,
                count: self.targets.len(),
            });
        }
        Ok(())
    }

    /// Scan one target file and build its rewritten contents.
    ///
    /// Nothing is written; the caller decides whether to call
    /// [`FileOutcome::write`]. Line terminators are preserved byte for
    /// byte, including a missing one on the final line.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the file cannot be read.
    pub fn process_file(&self, index: usize, path: &Path) -> Result<FileOutcome<'_>, FileError> {
        let text = fs::read_to_string(path).map_err(|error| FileError::read(path, error))?;
        let mut lines = Vec::new();
        let mut rebuilt = String::with_capacity(text.len());
        for (offset, (content, terminator)) in split_lines(&text).into_iter().enumerate() {
            let spans = engine::scan_line(content, &self.rules, &self.headings);
            if spans.is_empty() {
                rebuilt.push_str(content);
            } else {
                rebuilt.push_str(&engine::apply_spans(content, &spans));
                lines.push(LineMatches {
                    number: offset + 1,
                    content: content.to_string(),
                    spans,
                });
            }
            rebuilt.push_str(terminator);
        }
        let rewritten = (rebuilt != text).then_some(rebuilt);
        Ok(FileOutcome {
            path: path.to_path_buf(),
            index,
            lines,
            rewritten,
        })
    }

    /// Report every pointer use of a rule source in one target file.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the file cannot be read.
    pub fn scan_pointers(&self, path: &Path) -> Result<Vec<PointerHit<'_>>, FileError> {
        let text = fs::read_to_string(path).map_err(|error| FileError::read(path, error))?;
        let mut hits = Vec::new();
        for (offset, (content, _)) in split_lines(&text).into_iter().enumerate() {
            for pointer in scanner::find_pointer_uses(content, &self.rules) {
                let column = content
                    .get(..pointer.start)
                    .map_or(0, |prefix| prefix.chars().count())
                    + 1;
                hits.push(PointerHit {
                    number: offset + 1,
                    column,
                    start: pointer.start,
                    end: pointer.end,
                    content: content.to_string(),
                    source: pointer.source,
                });
            }
        }
        Ok(hits)
    }
}

/// The result of scanning one file: every matched line plus the rewritten
/// contents, held back until the caller commits it.
#[derive(Debug)]
pub struct FileOutcome<'r> {
    path: PathBuf,
    index: usize,
    lines: Vec<LineMatches<'r>>,
    rewritten: Option<String>,
}

impl<'r> FileOutcome<'r> {
    /// Path of the scanned file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One-based position in the session's target list.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Lines holding at least one replacement, in file order.
    #[must_use]
    pub fn lines(&self) -> &[LineMatches<'r>] {
        &self.lines
    }

    /// Total replacements across all lines.
    #[must_use]
    pub fn replacement_count(&self) -> usize {
        self.lines.iter().map(|line| line.spans.len()).sum()
    }

    /// Whether applying the replacements changes the file.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.rewritten.is_some()
    }

    /// Write the rewritten contents back to the file.
    ///
    /// Returns `true` when the file was written and `false` when there
    /// was no change to commit.
    ///
    /// # Errors
    ///
    /// Returns a [`FileError`] when the write fails.
    pub fn write(&self) -> Result<bool, FileError> {
        let Some(text) = &self.rewritten else {
            return Ok(false);
        };
        fs::write(&self.path, text).map_err(|error| FileError::write(&self.path, error))?;
        Ok(true)
    }
}

/// One line of a file with the replacements planned for it.
#[derive(Debug)]
pub struct LineMatches<'r> {
    number: usize,
    content: String,
    spans: Vec<Span<'r>>,
}

impl<'r> LineMatches<'r> {
    /// One-based line number.
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    /// The line as read, without its terminator.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The replacements, sorted by start offset.
    #[must_use]
    pub fn spans(&self) -> &[Span<'r>] {
        &self.spans
    }
}

/// One pointer use of a rule source.
#[derive(Debug, Clone)]
pub struct PointerHit<'r> {
    number: usize,
    column: usize,
    start: usize,
    end: usize,
    content: String,
    source: &'r str,
}

impl<'r> PointerHit<'r> {
    /// One-based line number.
    #[must_use]
    pub fn number(&self) -> usize {
        self.number
    }

    /// One-based character column of the source token.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Byte offset of the token start within the line.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the token end.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The line as read, without its terminator.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The rule source found in pointer position.
    #[must_use]
    pub fn source(&self) -> &'r str {
        self.source
    }
}

/// Split `text` into `(content, terminator)` pairs.
///
/// Terminators are kept verbatim (`\n` or `\r\n`; the final line may have
/// none) so the file can be rebuilt byte for byte.
fn split_lines(text: &str) -> Vec<(&str, &str)> {
    text.split_inclusive('\n')
        .map(|piece| {
            if let Some(content) = piece.strip_suffix("\r\n") {
                (content, "\r\n")
            } else if let Some(content) = piece.strip_suffix('\n') {
                (content, "\n")
            } else {
                (piece, "")
            }
        })
        .collect()
}
