//! Console rendering for summaries, previews, errors and totals.
//!
//! Every renderer writes through an [`io::Write`] sink, so the output is
//! testable and the library itself never prints. Color comes from
//! `colored`, which already honours `NO_COLOR` and non-terminal stdout;
//! callers can force it off with [`colored::control::set_override`].

use std::io::{self, Write};
use std::path::Path;

use colored::Colorize;

use crate::directive::ExprDiagnostic;
use crate::engine::Span;
use crate::errors::ConfigError;
use crate::pipeline::{FileOutcome, LineMatches, PointerHit, Session};

const LABEL_WIDTH: usize = 18;
const BANNER_WIDTH: usize = 78;

/// Counters accumulated across the files of one run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunTotals {
    files: usize,
    changed: usize,
    lines: usize,
    replacements: usize,
    written: usize,
}

impl RunTotals {
    /// Fold one file's outcome into the totals.
    pub fn absorb(&mut self, outcome: &FileOutcome<'_>) {
        self.files += 1;
        self.changed += usize::from(outcome.is_changed());
        self.lines += outcome.lines().len();
        self.replacements += outcome.replacement_count();
    }

    /// Count one committed rewrite. An `--apply` scoped to a single file
    /// writes fewer files than would change, so this is tracked apart
    /// from [`changed`](Self::changed).
    pub fn record_write(&mut self) {
        self.written += 1;
    }

    /// Files scanned.
    #[must_use]
    pub fn files(&self) -> usize {
        self.files
    }

    /// Files whose contents would change if every outcome were committed.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.changed
    }

    /// Lines holding at least one replacement.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Total replacements found.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Files actually rewritten.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Write the configuration summary: search roots, patterns, headings and
/// rule count. With `show_rules` the full rule table follows, sources
/// padded to a common width.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_config_summary<W: Write>(
    out: &mut W,
    session: &Session,
    show_rules: bool,
) -> io::Result<()> {
    write_labeled(out, "folders", &session.folders().join(", "))?;
    write_labeled(out, "files", &session.file_patterns().join(", "))?;
    if !session.exclude_patterns().is_empty() {
        write_labeled(out, "exclude files", &session.exclude_patterns().join(", "))?;
    }
    if !session.headings().is_empty() {
        write_labeled(out, "exclude headings", &session.headings().join(", "))?;
    }
    write_labeled(out, "rules", &session.rules().len().to_string())?;
    if show_rules {
        let width = session
            .rules()
            .iter()
            .map(|rule| rule.source().chars().count())
            .max()
            .unwrap_or(0);
        for rule in session.rules() {
            let padded = format!("{:<width$}", rule.source());
            writeln!(out, "  {} -> {}", padded.red(), rule.destination().green())?;
        }
    }
    Ok(())
}

fn write_labeled<W: Write>(out: &mut W, label: &str, value: &str) -> io::Result<()> {
    // Pad before coloring; escape codes would count into the width.
    let padded = format!("{:<LABEL_WIDTH$}", format!("{label}:"));
    writeln!(out, "{} {value}", padded.cyan())
}

/// Write the separator and `[index] path` header shown before each file's
/// matches.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_file_banner<W: Write>(out: &mut W, index: usize, path: &Path) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(BANNER_WIDTH).yellow())?;
    writeln!(out, "[{index}] {}", path.display())
}

/// Write one matched line as a two-line preview: the original with every
/// matched source in red, then the rewrite with every destination in
/// green.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_line_preview<W: Write>(out: &mut W, line: &LineMatches<'_>) -> io::Result<()> {
    let prefix = format!("LINE {:04}:", line.number());
    let original = render_spans(line.content(), line.spans(), false);
    writeln!(out, "{} {original}", prefix.cyan())?;
    let rewritten = render_spans(line.content(), line.spans(), true);
    writeln!(out, "{} {rewritten}", "     -->  ".cyan())
}

/// Rebuild `content` around its spans, coloring either the matched
/// sources or the substituted destinations.
fn render_spans(content: &str, spans: &[Span<'_>], rewritten: bool) -> String {
    let mut result = String::with_capacity(content.len());
    let mut cursor = 0;
    for span in spans {
        if let Some(gap) = content.get(cursor..span.start()) {
            result.push_str(gap);
        }
        let piece = if rewritten {
            span.destination().green().bold()
        } else {
            span.source().red().bold()
        };
        result.push_str(&piece.to_string());
        cursor = span.end();
    }
    if let Some(tail) = content.get(cursor..) {
        result.push_str(tail.trim_end());
    }
    result
}

/// Write the end-of-run totals, with a reminder line when the run was a
/// preview that found work to do.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_run_totals<W: Write>(
    out: &mut W,
    totals: &RunTotals,
    applied: bool,
) -> io::Result<()> {
    writeln!(
        out,
        "{} replacement(s) on {} line(s) across {} file(s)",
        totals.replacements, totals.lines, totals.files
    )?;
    if applied {
        writeln!(out, "rewrote {} file(s)", totals.written)
    } else if totals.replacements > 0 {
        writeln!(
            out,
            "preview only; re-run with --apply to rewrite {} file(s)",
            totals.changed
        )
    } else {
        Ok(())
    }
}

/// A fatal error prepared for rendering: message, optional location,
/// offending content and note.
#[derive(Debug)]
pub struct ErrorBlock {
    message: String,
    location: Option<(String, usize)>,
    content: Option<String>,
    note: Option<String>,
}

impl ErrorBlock {
    /// A block carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            content: None,
            note: None,
        }
    }

    /// Build a block from a configuration error's payloads, pointing at
    /// `path`.
    #[must_use]
    pub fn from_config_error(path: &Path, error: &ConfigError) -> Self {
        Self {
            message: error.to_string(),
            location: error
                .line_number()
                .map(|number| (path.display().to_string(), number)),
            content: error.line().map(str::to_string),
            note: error.detail(),
        }
    }
}

/// Write a uniform error block:
///
/// ```text
/// error: duplicate swap source `u32`
///   --> config.ini:9
///    | u32/uint32_t
///    = note: `u32` first declared at line 3
/// ```
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_error_block<W: Write>(out: &mut W, block: &ErrorBlock) -> io::Result<()> {
    writeln!(out, "{} {}", "error:".red().bold(), block.message)?;
    if let Some((file, number)) = &block.location {
        writeln!(out, "  --> {file}:{number}")?;
    }
    if let Some(content) = &block.content {
        writeln!(out, "   | {content}")?;
    }
    if let Some(note) = &block.note {
        writeln!(out, "   = note: {note}")?;
    }
    Ok(())
}

/// Write a non-fatal warning for an `#if`/`#elif` condition that failed
/// to evaluate.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_condition_warning<W: Write>(
    out: &mut W,
    path: &Path,
    diagnostic: &ExprDiagnostic,
) -> io::Result<()> {
    writeln!(out, "{} {diagnostic}", "warning:".yellow().bold())?;
    writeln!(out, "  --> {}:{}", path.display(), diagnostic.line_number)?;
    writeln!(out, "   | {}", diagnostic.line)
}

/// Write one pointer hit as `path:line:column:` plus the line, with the
/// token and its `*` marked.
///
/// # Errors
///
/// Returns any error from the sink.
pub fn write_pointer_hit<W: Write>(
    out: &mut W,
    path: &Path,
    hit: &PointerHit<'_>,
) -> io::Result<()> {
    let content = hit.content();
    let star_end = content
        .get(hit.end()..)
        .and_then(|rest| rest.find('*'))
        .map_or(hit.end(), |at| hit.end() + at + 1);
    let before = content.get(..hit.start()).unwrap_or_default();
    let marked = content.get(hit.start()..star_end).unwrap_or_default();
    let after = content.get(star_end..).unwrap_or_default();
    writeln!(
        out,
        "{}:{}:{}: {before}{}{}",
        path.display(),
        hit.number(),
        hit.column(),
        marked.magenta().bold(),
        after.trim_end()
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests render into in-memory buffers")]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::parse_config;
    use crate::directive::ExprError;
    use crate::rules::RuleSet;

    fn rendered(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    fn session_in(dir: &TempDir, swap: &str) -> Session {
        let text = format!(
            "Folder = {}\nFiles = *.h\nExcludeHeading = //SKIP\nSwap = {{\n{swap}\n}}\n",
            dir.path().display()
        );
        let config = parse_config(&text).unwrap().config;
        let rules = RuleSet::compile(config.swap_value().unwrap(), config.line_map()).unwrap();
        Session::prepare(&config, rules).unwrap()
    }

    #[test]
    fn summary_lists_values_and_rule_table() {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir, "u32/uint32_t,\nu8/uint8_t");
        let mut buffer = Vec::new();
        write_config_summary(&mut buffer, &session, true).unwrap();
        let text = rendered(buffer);
        assert!(text.contains("files:"), "summary: {text}");
        assert!(text.contains("*.h"), "summary: {text}");
        assert!(text.contains("exclude headings:"), "summary: {text}");
        let rules_line = format!("{:<18} 2", "rules:");
        assert!(text.contains(&rules_line), "summary: {text}");
        assert!(text.contains("  u32 -> uint32_t"), "summary: {text}");
        assert!(text.contains("  u8  -> uint8_t"), "summary: {text}");
    }

    #[test]
    fn banner_numbers_the_file() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        write_file_banner(&mut buffer, 3, Path::new("/work/src/types.h")).unwrap();
        let text = rendered(buffer);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "-".repeat(78));
        assert_eq!(lines.next().unwrap(), "[3] /work/src/types.h");
    }

    #[test]
    fn preview_shows_original_and_rewrite() {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.h");
        std::fs::write(&path, "u32 a; u32 b;\n").unwrap();
        let session = session_in(&dir, "u32/uint32_t");
        let outcome = session.process_file(1, &path).unwrap();
        let mut buffer = Vec::new();
        write_line_preview(&mut buffer, &outcome.lines()[0]).unwrap();
        assert_eq!(
            rendered(buffer),
            "LINE 0001: u32 a; u32 b;\n     -->   uint32_t a; uint32_t b;\n"
        );
    }

    #[test]
    fn totals_roll_up_and_remind_about_apply() {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.h");
        std::fs::write(&path, "u32 a;\nu32 b;\n").unwrap();
        let session = session_in(&dir, "u32/uint32_t");
        let outcome = session.process_file(1, &path).unwrap();
        let mut totals = RunTotals::default();
        totals.absorb(&outcome);
        assert_eq!(totals.files(), 1);
        assert_eq!(totals.changed(), 1);
        assert_eq!(totals.lines(), 2);
        assert_eq!(totals.replacements(), 2);
        let mut buffer = Vec::new();
        write_run_totals(&mut buffer, &totals, false).unwrap();
        assert_eq!(
            rendered(buffer),
            "2 replacement(s) on 2 line(s) across 1 file(s)\n\
             preview only; re-run with --apply to rewrite 1 file(s)\n"
        );
        totals.record_write();
        let mut buffer = Vec::new();
        write_run_totals(&mut buffer, &totals, true).unwrap();
        assert!(rendered(buffer).ends_with("rewrote 1 file(s)\n"));
    }

    #[test]
    fn empty_preview_skips_the_reminder() {
        colored::control::set_override(false);
        let totals = RunTotals::default();
        let mut buffer = Vec::new();
        write_run_totals(&mut buffer, &totals, false).unwrap();
        assert_eq!(rendered(buffer), "0 replacement(s) on 0 line(s) across 0 file(s)\n");
    }

    #[test]
    fn error_block_renders_every_section() {
        colored::control::set_override(false);
        let error = ConfigError::DuplicateSwapSource {
            source: "u32".into(),
            entry: "u32/uint32_t".into(),
            line_number: Some(9),
            first_line: Some(3),
        };
        let block = ErrorBlock::from_config_error(Path::new("config.ini"), &error);
        let mut buffer = Vec::new();
        write_error_block(&mut buffer, &block).unwrap();
        assert_eq!(
            rendered(buffer),
            "error: duplicate swap source `u32`\n\
             \x20 --> config.ini:9\n\
             \x20  | u32/uint32_t\n\
             \x20  = note: `u32` first declared at line 3\n"
        );
    }

    #[test]
    fn message_only_block_is_one_line() {
        colored::control::set_override(false);
        let block = ErrorBlock::message("no search folders configured");
        let mut buffer = Vec::new();
        write_error_block(&mut buffer, &block).unwrap();
        assert_eq!(rendered(buffer), "error: no search folders configured\n");
    }

    #[test]
    fn condition_warning_points_at_the_line() {
        colored::control::set_override(false);
        let diagnostic = ExprDiagnostic {
            expression: "FOO > 1".into(),
            line: "#if FOO > 1".into(),
            line_number: 3,
            error: ExprError::UnknownSymbol("FOO".into()),
        };
        let mut buffer = Vec::new();
        write_condition_warning(&mut buffer, Path::new("config.ini"), &diagnostic).unwrap();
        assert_eq!(
            rendered(buffer),
            "warning: condition `FOO > 1` could not be evaluated \
             (unknown symbol `FOO`); treated as false\n\
             \x20 --> config.ini:3\n\
             \x20  | #if FOO > 1\n"
        );
    }

    #[test]
    fn pointer_hits_show_position_and_line() {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.h");
        std::fs::write(&path, "static u32 *head;\n").unwrap();
        let session = session_in(&dir, "u32/uint32_t");
        let hits = session.scan_pointers(&path).unwrap();
        assert_eq!(hits.len(), 1);
        let mut buffer = Vec::new();
        write_pointer_hit(&mut buffer, &path, &hits[0]).unwrap();
        assert_eq!(
            rendered(buffer),
            format!("{}:1:8: static u32 *head;\n", path.display())
        );
    }
}
