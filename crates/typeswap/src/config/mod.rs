//! Configuration file parsing.
//!
//! Configuration files are line oriented: comments (`//`, `/*`), directive
//! lines (`#...`), `Key = value` pairs, and `Swap = { }` blocks holding
//! substitution entries. Directive lines gate everything that follows
//! them, so one file can describe several alternative substitution sets.

mod model;
mod parser;

pub use model::{Config, LineMap};
pub use parser::{ParsedConfig, parse_config};

/// Split `value` on commas that sit outside double quotes.
///
/// Segments are returned untrimmed so callers keep control over how much
/// whitespace matters.
pub(crate) fn split_quoted_list(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (idx, ch) in value.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Remove one pair of surrounding double quotes, if both are present.
pub(crate) fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

/// Whether `text` begins a `typedef` entry (the keyword followed by
/// whitespace).
pub(crate) fn is_typedef(text: &str) -> bool {
    text.strip_prefix("typedef")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("a, b", vec!["a", " b"])]
    #[case("a", vec!["a"])]
    #[case("", vec![""])]
    #[case("\"a, b\", c", vec!["\"a, b\"", " c"])]
    #[case("x,,y", vec!["x", "", "y"])]
    fn splits_on_unquoted_commas_only(#[case] value: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_quoted_list(value), expected);
    }

    #[rstest]
    #[case("\"quoted\"", "quoted")]
    #[case("\" spaced \"", " spaced ")]
    #[case("plain", "plain")]
    #[case("\"unbalanced", "\"unbalanced")]
    #[case("\"", "\"")]
    fn strips_only_balanced_quotes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_quotes(input), expected);
    }

    #[rstest]
    #[case("typedef int i32;", true)]
    #[case("typedef\tunsigned u;", true)]
    #[case("typedefs = 3", false)]
    #[case("typedef", false)]
    fn recognises_typedef_entries(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_typedef(text), expected);
    }
}
