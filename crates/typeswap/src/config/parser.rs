//! Line-oriented configuration parsing.

use crate::directive::{DirectiveEvaluator, ExprDiagnostic};
use crate::errors::ConfigError;

use super::Config;

/// A parsed configuration plus the condition diagnostics gathered on the
/// way through.
#[derive(Debug)]
pub struct ParsedConfig {
    pub config: Config,
    pub diagnostics: Vec<ExprDiagnostic>,
}

/// Parse the full text of a configuration file.
///
/// Lines are classified in priority order: blank, comment, directive,
/// swap-block delimiters, swap entries (inside a block), `typedef` (an
/// error outside a block), `Key = value`, and finally an error for
/// anything else. Lines inside inactive conditional branches are ignored
/// entirely, so alternative configuration sections may hold content that
/// would not parse on its own.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered: malformed or unpaired
/// directives, swap-block structure errors, unrecognised lines, or blocks
/// left open at end of file.
///
/// # Examples
/// ```
/// let parsed = typeswap::parse_config("Folder = src\nFiles = *.h\n")
///     .expect("configuration parses");
/// assert_eq!(parsed.config.folders(), vec!["src"]);
/// ```
pub fn parse_config(text: &str) -> Result<ParsedConfig, ConfigError> {
    let mut parser = ConfigParser::default();
    let mut final_line = 0;
    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        final_line = number;
        parser.handle_line(line, number)?;
    }
    parser.finish(final_line)
}

#[derive(Default)]
struct ConfigParser {
    evaluator: DirectiveEvaluator,
    config: Config,
    in_swap: bool,
}

impl ConfigParser {
    fn handle_line(&mut self, raw: &str, number: usize) -> Result<(), ConfigError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        self.config.record_line(line, number);
        if line.starts_with("//") || line.starts_with("/*") {
            return Ok(());
        }
        if line.starts_with('#') {
            return self.evaluator.handle(line, number);
        }
        if self.evaluator.is_skipping() {
            return Ok(());
        }
        if is_swap_open(line) {
            if self.in_swap {
                return Err(ConfigError::NestedSwapBlock {
                    line: line.to_string(),
                    line_number: number,
                });
            }
            self.in_swap = true;
            return Ok(());
        }
        if line == "}" {
            if !self.in_swap {
                return Err(ConfigError::UnmatchedSwapClose {
                    line: line.to_string(),
                    line_number: number,
                });
            }
            self.in_swap = false;
            return Ok(());
        }
        if self.in_swap {
            if super::is_typedef(line) {
                self.config.append_swap_entry(line);
            } else {
                let entry = line.strip_suffix(',').unwrap_or(line).trim_end();
                if !entry.is_empty() {
                    self.config.append_swap_entry(entry);
                }
            }
            return Ok(());
        }
        if super::is_typedef(line) {
            return Err(ConfigError::TypedefOutsideSwap {
                line: line.to_string(),
                line_number: number,
            });
        }
        if let Some((raw_key, raw_value)) = line.split_once('=') {
            let key = raw_key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidLine {
                    line: line.to_string(),
                    line_number: number,
                });
            }
            let value = raw_value.trim();
            let value = value.strip_suffix(',').unwrap_or(value).trim_end();
            self.config.merge_value(key, value);
            return Ok(());
        }
        Err(ConfigError::InvalidLine {
            line: line.to_string(),
            line_number: number,
        })
    }

    fn finish(mut self, final_line: usize) -> Result<ParsedConfig, ConfigError> {
        if self.in_swap {
            return Err(ConfigError::UnclosedSwapBlock {
                line_number: final_line,
            });
        }
        self.evaluator.finish(final_line)?;
        log::debug!(
            "parsed {final_line} line(s), {} macro(s) defined",
            self.evaluator.macros().len()
        );
        Ok(ParsedConfig {
            diagnostics: self.evaluator.take_diagnostics(),
            config: self.config,
        })
    }
}

/// Whether `line` opens a swap block: `Swap`, `=`, `{` with optional
/// whitespace between them and nothing after.
fn is_swap_open(line: &str) -> bool {
    line.strip_prefix("Swap")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .map(str::trim_start)
        .is_some_and(|rest| rest == "{")
}
