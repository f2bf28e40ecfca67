//! Pointer-style use reporting.
//!
//! A reconnaissance mode for C-family code: before renaming a type it is
//! useful to know where values of that type are declared as pointers,
//! since those declarations often need manual attention after a swap.
//! A pointer use is a word-bounded occurrence of a rule source whose next
//! non-whitespace character is `*`.

use crate::engine;
use crate::rules::RuleSet;

/// One pointer-style occurrence within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerSpan<'r> {
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// The rule source that matched.
    pub source: &'r str,
}

/// Find every pointer-style use of a rule source in `line`.
///
/// Matches are filtered by the same word-boundary test substitution uses,
/// then kept only when the next non-whitespace character after the match
/// is `*`. Results are ordered by start offset.
#[must_use]
pub fn find_pointer_uses<'r>(line: &str, rules: &'r RuleSet) -> Vec<PointerSpan<'r>> {
    let mut hits = Vec::new();
    for rule in rules.iter() {
        for found in rule.pattern().find_iter(line) {
            let (start, end) = (found.start(), found.end());
            if !engine::word_bounded(line, start, end) {
                continue;
            }
            if !followed_by_star(line, end) {
                continue;
            }
            hits.push(PointerSpan {
                start,
                end,
                source: rule.source(),
            });
        }
    }
    hits.sort_by_key(|hit| hit.start);
    hits
}

/// Whether the first non-whitespace character at or after `at` is `*`.
fn followed_by_star(line: &str, at: usize) -> bool {
    line.get(at..)
        .and_then(|suffix| suffix.chars().find(|ch| !ch.is_whitespace()))
        == Some('*')
}
