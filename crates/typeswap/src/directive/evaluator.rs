//! Conditional-inclusion state driven by configuration directives.

use std::fmt;

use crate::errors::ConfigError;

use super::expr::{self, ExprError};
use super::MacroTable;

/// One open `#if`/`#ifdef`/`#ifndef` block on the conditional stack.
#[derive(Debug, Clone, Copy)]
struct Branch {
    /// Whether any branch of this block has activated so far. Once set,
    /// later `#elif`/`#else` branches stay inactive.
    taken: bool,
    /// Whether the branch currently open is active.
    active: bool,
    /// Whether the enclosing scope was active when this block opened.
    parent_active: bool,
}

/// A condition that failed to evaluate and was treated as false.
///
/// Evaluation failures are deliberately not fatal: the run continues with
/// the branch skipped, and the failure is surfaced to the caller once
/// parsing completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprDiagnostic {
    /// The condition text as written, without the directive keyword.
    pub expression: String,
    /// The full directive line.
    pub line: String,
    /// One-based line number in the configuration file.
    pub line_number: usize,
    /// Why evaluation failed.
    pub error: ExprError,
}

impl fmt::Display for ExprDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "condition `{}` could not be evaluated ({}); treated as false",
            self.expression, self.error
        )
    }
}

/// Macro table and conditional stack for one configuration file.
///
/// Feed every directive line through [`handle`](Self::handle) in file
/// order, consult [`is_skipping`](Self::is_skipping) for the lines in
/// between, and call [`finish`](Self::finish) at end of file to diagnose
/// unclosed blocks.
#[derive(Debug, Default)]
pub struct DirectiveEvaluator {
    macros: MacroTable,
    stack: Vec<Branch>,
    diagnostics: Vec<ExprDiagnostic>,
}

impl DirectiveEvaluator {
    /// Create an evaluator with an empty macro table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether ordinary lines should currently be ignored.
    ///
    /// True when the innermost open block is inactive or was opened inside
    /// an inactive scope. Blocks opened while skipping record an inactive
    /// parent, so the flag stays set until the enclosing block closes.
    #[must_use]
    pub fn is_skipping(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|branch| !(branch.active && branch.parent_active))
    }

    /// Number of conditional blocks currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The macros defined so far.
    #[must_use]
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Conditions that failed to evaluate, in file order.
    #[must_use]
    pub fn diagnostics(&self) -> &[ExprDiagnostic] {
        &self.diagnostics
    }

    /// Take ownership of the accumulated diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ExprDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Process one directive line (trimmed, starting with `#`).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown keywords, `#define`/`#ifdef`/
    /// `#ifndef` without a name, and `#elif`/`#else`/`#endif` outside any
    /// open block. Failed `#if`/`#elif` conditions are not errors; they are
    /// recorded as diagnostics and the branch is treated as false.
    pub fn handle(&mut self, line: &str, line_number: usize) -> Result<(), ConfigError> {
        let Some(body) = line.trim_start().strip_prefix('#') else {
            return Err(ConfigError::InvalidLine {
                line: line.to_string(),
                line_number,
            });
        };
        let body = body.trim_start();
        let (keyword, rest) = match body.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (body, ""),
        };
        match keyword {
            "define" => self.define(rest, line, line_number),
            "ifdef" => self.open_defined_check(rest, false, line, line_number),
            "ifndef" => self.open_defined_check(rest, true, line, line_number),
            "if" => {
                self.open_condition(rest, line, line_number);
                Ok(())
            }
            "elif" => self.reopen_condition(rest, line, line_number),
            "else" => self.reopen_else(line, line_number),
            "endif" => self.close(line, line_number),
            _ => Err(ConfigError::UnknownDirective {
                keyword: keyword.to_string(),
                line: line.to_string(),
                line_number,
            }),
        }
    }

    /// Diagnose conditional blocks left open at end of file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnclosedConditionals`] when any block is
    /// still open.
    pub fn finish(&self, final_line: usize) -> Result<(), ConfigError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::UnclosedConditionals {
                count: self.stack.len(),
                line_number: final_line,
            })
        }
    }

    fn define(&mut self, rest: &str, line: &str, line_number: usize) -> Result<(), ConfigError> {
        if self.is_skipping() {
            return Ok(());
        }
        let (name, value) = match rest.split_once(char::is_whitespace) {
            Some((name, value)) => (name, value.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            return Err(ConfigError::MissingName {
                directive: "define",
                line: line.to_string(),
                line_number,
            });
        }
        let value = if value.is_empty() { "1" } else { value };
        self.macros.define(name, value);
        Ok(())
    }

    fn open_defined_check(
        &mut self,
        name: &str,
        negate: bool,
        line: &str,
        line_number: usize,
    ) -> Result<(), ConfigError> {
        let parent_active = !self.is_skipping();
        if parent_active && name.is_empty() {
            return Err(ConfigError::MissingName {
                directive: if negate { "ifndef" } else { "ifdef" },
                line: line.to_string(),
                line_number,
            });
        }
        let active = parent_active && (self.macros.is_defined(name) != negate);
        self.stack.push(Branch {
            taken: active,
            active,
            parent_active,
        });
        Ok(())
    }

    fn open_condition(&mut self, condition: &str, line: &str, line_number: usize) {
        let parent_active = !self.is_skipping();
        let active = parent_active && self.check(condition, line, line_number);
        self.stack.push(Branch {
            taken: active,
            active,
            parent_active,
        });
    }

    fn reopen_condition(
        &mut self,
        condition: &str,
        line: &str,
        line_number: usize,
    ) -> Result<(), ConfigError> {
        let Some(&Branch {
            taken,
            parent_active,
            ..
        }) = self.stack.last()
        else {
            return Err(ConfigError::UnpairedDirective {
                directive: "elif",
                line: line.to_string(),
                line_number,
            });
        };
        // Conditions in chains that already activated a branch are not
        // evaluated, so they can neither define diagnostics nor side-step
        // the first-match-wins rule.
        let active = !taken && parent_active && self.check(condition, line, line_number);
        if let Some(top) = self.stack.last_mut() {
            top.active = active;
            top.taken = top.taken || active;
        }
        Ok(())
    }

    fn reopen_else(&mut self, line: &str, line_number: usize) -> Result<(), ConfigError> {
        let Some(top) = self.stack.last_mut() else {
            return Err(ConfigError::UnpairedDirective {
                directive: "else",
                line: line.to_string(),
                line_number,
            });
        };
        top.active = !top.taken && top.parent_active;
        top.taken = true;
        Ok(())
    }

    fn close(&mut self, line: &str, line_number: usize) -> Result<(), ConfigError> {
        if self.stack.pop().is_none() {
            return Err(ConfigError::UnpairedDirective {
                directive: "endif",
                line: line.to_string(),
                line_number,
            });
        }
        Ok(())
    }

    fn check(&mut self, condition: &str, line: &str, line_number: usize) -> bool {
        match expr::evaluate(condition, &self.macros) {
            Ok(value) => value,
            Err(error) => {
                log::debug!("line {line_number}: condition `{condition}` failed to evaluate: {error}");
                self.diagnostics.push(ExprDiagnostic {
                    expression: condition.to_string(),
                    line: line.to_string(),
                    line_number,
                    error,
                });
                false
            }
        }
    }
}
