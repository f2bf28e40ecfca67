//! Error types shared by the configuration and substitution modules.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while parsing a configuration file or compiling its swap
/// rules.
///
/// Every variant that originates from a concrete configuration line carries
/// that line's text and one-based number so callers can point at the source.
/// The [`line_number`](ConfigError::line_number), [`line`](ConfigError::line)
/// and [`detail`](ConfigError::detail) accessors expose those payloads
/// uniformly for rendering.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A `#` line whose keyword is not one of the recognised directives.
    #[error("unknown directive `#{keyword}`")]
    UnknownDirective {
        keyword: String,
        line: String,
        line_number: usize,
    },
    /// `#elif`, `#else` or `#endif` with no conditional block open.
    #[error("`#{directive}` without a matching `#if`")]
    UnpairedDirective {
        directive: &'static str,
        line: String,
        line_number: usize,
    },
    /// `#define`, `#ifdef` or `#ifndef` missing its macro name.
    #[error("`#{directive}` is missing a name")]
    MissingName {
        directive: &'static str,
        line: String,
        line_number: usize,
    },
    /// `Swap = {` encountered while a swap block is already open.
    #[error("`Swap = {{` opened inside another swap block")]
    NestedSwapBlock { line: String, line_number: usize },
    /// `}` encountered with no swap block open.
    #[error("`}}` without an open swap block")]
    UnmatchedSwapClose { line: String, line_number: usize },
    /// A `typedef` entry outside any `Swap = { }` block.
    #[error("`typedef` entries are only valid inside a `Swap = {{ }}` block")]
    TypedefOutsideSwap { line: String, line_number: usize },
    /// A non-empty line that matches no recognised form.
    #[error("unrecognised configuration line")]
    InvalidLine { line: String, line_number: usize },
    /// End of file reached while a swap block was still open.
    #[error("swap block is never closed; missing `}}`")]
    UnclosedSwapBlock { line_number: usize },
    /// End of file reached with conditional blocks still open.
    #[error("{count} conditional block(s) left open at end of file")]
    UnclosedConditionals { count: usize, line_number: usize },
    /// A plain swap entry without exactly one `/` separator.
    #[error("swap entry must contain exactly one `/` separating source and destination")]
    MalformedSwapPair {
        entry: String,
        line_number: Option<usize>,
    },
    /// A `typedef` entry that does not parse as `typedef <type> <name>;`.
    #[error("`typedef` entry is not of the form `typedef <type> <name>;`")]
    MalformedTypedef {
        entry: String,
        line_number: Option<usize>,
    },
    /// A swap entry whose source or destination is empty after trimming.
    #[error("swap entry has an empty source or destination")]
    EmptySwapSide {
        entry: String,
        line_number: Option<usize>,
    },
    /// Two swap entries that share the same source token.
    #[error("duplicate swap source `{source}`")]
    DuplicateSwapSource {
        // Declared raw so thiserror does not infer this `String` field as the
        // variant's `Error::source()`; `r#source` and `source` are the same
        // identifier at every use site.
        r#source: String,
        entry: String,
        line_number: Option<usize>,
        first_line: Option<usize>,
    },
    /// A swap source whose escaped pattern failed to compile.
    #[error("swap pattern for `{source}` failed to compile")]
    RulePattern {
        source: String,
        #[source]
        error: regex::Error,
    },
}

impl ConfigError {
    /// One-based configuration line the error points at, when known.
    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::UnknownDirective { line_number, .. }
            | Self::UnpairedDirective { line_number, .. }
            | Self::MissingName { line_number, .. }
            | Self::NestedSwapBlock { line_number, .. }
            | Self::UnmatchedSwapClose { line_number, .. }
            | Self::TypedefOutsideSwap { line_number, .. }
            | Self::InvalidLine { line_number, .. }
            | Self::UnclosedSwapBlock { line_number }
            | Self::UnclosedConditionals { line_number, .. } => Some(*line_number),
            Self::MalformedSwapPair { line_number, .. }
            | Self::MalformedTypedef { line_number, .. }
            | Self::EmptySwapSide { line_number, .. }
            | Self::DuplicateSwapSource { line_number, .. } => *line_number,
            Self::RulePattern { .. } => None,
        }
    }

    /// The offending line or swap entry text, when the error carries one.
    #[must_use]
    pub fn line(&self) -> Option<&str> {
        match self {
            Self::UnknownDirective { line, .. }
            | Self::UnpairedDirective { line, .. }
            | Self::MissingName { line, .. }
            | Self::NestedSwapBlock { line, .. }
            | Self::UnmatchedSwapClose { line, .. }
            | Self::TypedefOutsideSwap { line, .. }
            | Self::InvalidLine { line, .. } => Some(line),
            Self::MalformedSwapPair { entry, .. }
            | Self::MalformedTypedef { entry, .. }
            | Self::EmptySwapSide { entry, .. }
            | Self::DuplicateSwapSource { entry, .. } => Some(entry),
            Self::UnclosedSwapBlock { .. }
            | Self::UnclosedConditionals { .. }
            | Self::RulePattern { .. } => None,
        }
    }

    /// Supplementary note for the error, when one adds useful context.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::UnknownDirective { .. } => Some(format!(
                "recognised directives: {}",
                crate::directive::DIRECTIVE_KEYWORDS.join(", ")
            )),
            Self::DuplicateSwapSource {
                source, first_line, ..
            } => Some(match first_line {
                Some(number) => {
                    format!("`{source}` first declared at line {number}")
                }
                None => format!("`{source}` declared more than once"),
            }),
            Self::RulePattern { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }
}

/// Errors raised while turning a parsed configuration into a runnable
/// substitution session.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No `Folder` key present, or every folder value was empty.
    #[error("no search folders configured; add a `Folder = <path>` line")]
    NoFolders,
    /// No `Files` key present, or every pattern value was empty.
    #[error("no file patterns configured; add a `Files = <pattern>` line")]
    NoFilePatterns,
    /// The swap block compiled to zero rules.
    #[error("no substitution rules configured; add a `Swap = {{ }}` block")]
    NoRules,
    /// One or more configured folders are absent on disk.
    #[error("search folder(s) do not exist: {}", paths.join(", "))]
    MissingFolders { paths: Vec<String> },
    /// A `Files` or `ExcludeFile` glob whose translated pattern failed to
    /// compile.
    #[error("invalid file pattern `{pattern}`")]
    BadPattern {
        pattern: String,
        #[source]
        error: regex::Error,
    },
    /// A requested file index outside the discovered target list.
    #[error("file index {index} is out of range (the run discovered {count} file(s))")]
    FileIndexOutOfRange { index: usize, count: usize },
}

/// The I/O operation a [`FileError`] was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Read,
    Write,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// An I/O failure while reading or rewriting a target file.
#[derive(Debug, Error)]
#[error("failed to {action} `{}`", path.display())]
pub struct FileError {
    pub action: FileAction,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self {
            action: FileAction::Read,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self {
            action: FileAction::Write,
            path: path.to_path_buf(),
            source,
        }
    }
}
