//! Preprocessor-style directive handling for configuration files.
//!
//! Configuration files may gate their lines behind `#define`, `#ifdef`,
//! `#ifndef`, `#if`, `#elif`, `#else` and `#endif`. The
//! [`DirectiveEvaluator`] tracks the macro table and the stack of open
//! conditional blocks; [`expr`] evaluates the restricted expression
//! language allowed in `#if` and `#elif` conditions.

use std::collections::HashMap;

mod evaluator;
mod expr;

pub use evaluator::{DirectiveEvaluator, ExprDiagnostic};
pub use expr::ExprError;

/// Directive keywords recognised after a leading `#`, in match order.
pub const DIRECTIVE_KEYWORDS: [&str; 7] = [
    "define", "ifdef", "ifndef", "if", "elif", "else", "endif",
];

/// Macro names and replacement values accumulated from `#define` lines.
///
/// A macro defined without an explicit value holds `"1"`, so `#define DEBUG`
/// makes both `#ifdef DEBUG` and `#if DEBUG` succeed.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: HashMap<String, String>,
}

impl MacroTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a macro.
    pub fn define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Whether `name` has been defined.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The replacement value for `name`, if defined.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of defined macros.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no macros are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_define_defaults_to_one() {
        let mut table = MacroTable::new();
        table.define("DEBUG", "1");
        assert!(table.is_defined("DEBUG"));
        assert_eq!(table.value("DEBUG"), Some("1"));
        assert!(!table.is_defined("RELEASE"));
    }

    #[test]
    fn redefinition_replaces_the_value() {
        let mut table = MacroTable::new();
        table.define("VERSION", "2");
        table.define("VERSION", "3");
        assert_eq!(table.value("VERSION"), Some("3"));
        assert_eq!(table.len(), 1);
    }
}
