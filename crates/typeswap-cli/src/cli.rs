//! Argument parsing and mode dispatch for the `typeswap` binary.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use serde::Serialize;
use typeswap::pipeline::FileOutcome;
use typeswap::report::{self, ErrorBlock, RunTotals};
use typeswap::{RuleSet, Session, parse_config};

/// Configuration-driven mass token substitution with preview and apply.
#[derive(Parser, Debug)]
#[command(name = "typeswap", version, about)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag is an independent CLI switch"
)]
pub(crate) struct Cli {
    /// Path to the configuration file.
    #[arg(value_name = "CONFIG", default_value = "config.ini")]
    config: PathBuf,

    /// Apply the substitutions; `--apply=N` rewrites only file N of the
    /// preview listing.
    #[arg(
        short = 'y',
        long,
        value_name = "FILE_INDEX",
        num_args = 0..=1,
        require_equals = true
    )]
    apply: Option<Option<usize>>,

    /// Print the parsed configuration and rule table, then exit.
    #[arg(short = 'c', long)]
    config_only: bool,

    /// Report pointer-style uses of rule sources instead of substituting.
    #[arg(short = 'p', long)]
    pointers: bool,

    /// Emit the replacement report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable ANSI colour in the output.
    #[arg(long)]
    no_color: bool,
}

/// One file's replacements for the `--json` report.
#[derive(Serialize)]
struct FileReport {
    path: String,
    replacements: Vec<ReplacementReport>,
}

#[derive(Serialize)]
struct ReplacementReport {
    line: usize,
    column: usize,
    source: String,
    destination: String,
}

impl From<&FileOutcome<'_>> for FileReport {
    fn from(outcome: &FileOutcome<'_>) -> Self {
        let mut replacements = Vec::with_capacity(outcome.replacement_count());
        for line in outcome.lines() {
            for span in line.spans() {
                let column = line
                    .content()
                    .get(..span.start())
                    .map_or(0, |prefix| prefix.chars().count())
                    + 1;
                replacements.push(ReplacementReport {
                    line: line.number(),
                    column,
                    source: span.source().to_string(),
                    destination: span.destination().to_string(),
                });
            }
        }
        Self {
            path: outcome.path().display().to_string(),
            replacements,
        }
    }
}

/// Parse the command line, run the selected mode and map fatal errors to
/// an exit code.
///
/// # Errors
///
/// Returns an error for I/O failures outside the structured error paths,
/// such as an unreadable configuration file or a broken output pipe.
pub(crate) fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    let text = fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("failed to read configuration `{}`", cli.config.display()))?;
    let mut stderr = io::stderr();
    let parsed = match parse_config(&text) {
        Ok(parsed) => parsed,
        Err(error) => {
            return fail_with(&mut stderr, &ErrorBlock::from_config_error(&cli.config, &error));
        }
    };
    for diagnostic in &parsed.diagnostics {
        report::write_condition_warning(&mut stderr, &cli.config, diagnostic)?;
    }
    let config = parsed.config;
    let swap = config.swap_value().unwrap_or_default();
    let rules = match RuleSet::compile(swap, config.line_map()) {
        Ok(rules) => rules,
        Err(error) => {
            return fail_with(&mut stderr, &ErrorBlock::from_config_error(&cli.config, &error));
        }
    };
    let session = match Session::prepare(&config, rules) {
        Ok(session) => session,
        Err(error) => return fail_with(&mut stderr, &ErrorBlock::message(error.to_string())),
    };
    let mut stdout = io::stdout();
    if cli.config_only {
        report::write_config_summary(&mut stdout, &session, true)?;
        return finish(&mut stdout);
    }
    if cli.pointers {
        return write_pointer_report(&mut stdout, &mut stderr, &session);
    }
    run_substitutions(&mut stdout, &mut stderr, &session, &cli)
}

/// Render a fatal error block on stderr and request exit code 1.
fn fail_with<E: Write>(stderr: &mut E, block: &ErrorBlock) -> Result<ExitCode> {
    report::write_error_block(stderr, block)?;
    Ok(ExitCode::FAILURE)
}

fn finish<W: Write>(stdout: &mut W) -> Result<ExitCode> {
    stdout.flush().wrap_err("failed to flush report output")?;
    Ok(ExitCode::SUCCESS)
}

/// Scan every target for pointer-style uses of rule sources. Unreadable
/// files are reported and skipped; the scan never mutates.
fn write_pointer_report<W, E>(stdout: &mut W, stderr: &mut E, session: &Session) -> Result<ExitCode>
where
    W: Write,
    E: Write,
{
    let mut found = 0usize;
    for path in session.targets() {
        match session.scan_pointers(path) {
            Ok(hits) => {
                found += hits.len();
                for hit in &hits {
                    report::write_pointer_hit(stdout, path, hit)?;
                }
            }
            Err(error) => {
                writeln!(stderr, "{} {error}; file skipped", "warning:".yellow().bold())?;
            }
        }
    }
    writeln!(stdout, "{found} pointer use(s)")?;
    finish(stdout)
}

/// Preview every target and commit rewrites according to `--apply`.
fn run_substitutions<W, E>(
    stdout: &mut W,
    stderr: &mut E,
    session: &Session,
    cli: &Cli,
) -> Result<ExitCode>
where
    W: Write,
    E: Write,
{
    if let Some(Some(index)) = cli.apply {
        if let Err(error) = session.check_index(index) {
            return fail_with(stderr, &ErrorBlock::message(error.to_string()));
        }
    }
    let mut totals = RunTotals::default();
    let mut reports: Vec<FileReport> = Vec::new();
    for (offset, path) in session.targets().iter().enumerate() {
        let index = offset + 1;
        let outcome = match session.process_file(index, path) {
            Ok(outcome) => outcome,
            Err(error) => return fail_with(stderr, &ErrorBlock::message(error.to_string())),
        };
        if !outcome.lines().is_empty() {
            if cli.json {
                reports.push(FileReport::from(&outcome));
            } else {
                report::write_file_banner(stdout, index, path)?;
                for line in outcome.lines() {
                    report::write_line_preview(stdout, line)?;
                }
            }
        }
        totals.absorb(&outcome);
        if should_commit(cli.apply, index) {
            match outcome.write() {
                Ok(true) => totals.record_write(),
                Ok(false) => {}
                Err(error) => {
                    return fail_with(stderr, &ErrorBlock::message(error.to_string()));
                }
            }
        }
    }
    if cli.json {
        serde_json::to_writer(&mut *stdout, &reports)
            .wrap_err("failed to serialize the replacement report")?;
        stdout
            .write_all(b"\n")
            .wrap_err("failed to terminate JSON output with newline")?;
    } else {
        report::write_run_totals(stdout, &totals, cli.apply.is_some())?;
    }
    finish(stdout)
}

/// Whether this file's rewrite should be committed under the given
/// `--apply` value.
fn should_commit(apply: Option<Option<usize>>, index: usize) -> bool {
    match apply {
        Some(None) => true,
        Some(Some(target)) => target == index,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn commit_follows_the_apply_argument() {
        assert!(!should_commit(None, 1));
        assert!(should_commit(Some(None), 1));
        assert!(should_commit(Some(None), 9));
        assert!(should_commit(Some(Some(2)), 2));
        assert!(!should_commit(Some(Some(2)), 3));
    }

    #[test]
    fn file_reports_serialize_line_and_column() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("a.h");
        fs::write(&path, "int x; u32 y;\n")?;
        let config_text = format!(
            "Folder = {}\nFiles = *.h\nSwap = {{\nu32/uint32_t\n}}\n",
            dir.path().display()
        );
        let parsed = parse_config(&config_text)?;
        let swap = parsed
            .config
            .swap_value()
            .ok_or_else(|| eyre::eyre!("missing swap value"))?;
        let rules = RuleSet::compile(swap, parsed.config.line_map())?;
        let session = Session::prepare(&parsed.config, rules)?;
        let outcome = session.process_file(1, &path)?;
        let json = serde_json::to_value(FileReport::from(&outcome))?;
        let first = json
            .get("replacements")
            .and_then(|list| list.get(0))
            .ok_or_else(|| eyre::eyre!("missing replacement entry"))?;
        assert_eq!(first.get("line"), Some(&serde_json::Value::from(1_u64)));
        assert_eq!(first.get("column"), Some(&serde_json::Value::from(8_u64)));
        assert_eq!(
            first.get("source"),
            Some(&serde_json::Value::String("u32".into()))
        );
        assert_eq!(
            first.get("destination"),
            Some(&serde_json::Value::String("uint32_t".into()))
        );
        Ok(())
    }
}
