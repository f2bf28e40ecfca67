//! Word-boundary substitution over single lines.
//!
//! Rule sources are matched as literal text and then filtered by the
//! adjacent characters: a match is discarded when the character before it
//! is alphanumeric, `_` or `<`, or the character after it is alphanumeric,
//! `_` or `>`. The `<`/`>` asymmetry keeps template arguments such as
//! `vector<u32>` intact. Checking neighbours rather than consuming them
//! means adjacent occurrences (`u32 u32`) are both found.

use crate::rules::{RuleSet, SwapRule};

/// One planned replacement within a line.
///
/// Spans hold byte offsets into the scanned line and borrow the rule that
/// produced them.
#[derive(Debug, Clone, Copy)]
pub struct Span<'r> {
    start: usize,
    end: usize,
    rule: &'r SwapRule,
}

impl<'r> Span<'r> {
    /// Byte offset of the match start.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the match end.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The matched source token.
    #[must_use]
    pub fn source(&self) -> &'r str {
        self.rule.source()
    }

    /// The text to substitute in.
    #[must_use]
    pub fn destination(&self) -> &'r str {
        self.rule.destination()
    }
}

/// Collect every replacement the rules would make on `line`.
///
/// Rules are tried in rule-set order (longest source first), so when two
/// matches overlap the longer source wins and the later match is
/// discarded. If any heading marker occurs in the line, matches starting
/// at or after the earliest marker are discarded. The returned spans are
/// sorted by start offset and never overlap.
#[must_use]
pub fn scan_line<'r>(line: &str, rules: &'r RuleSet, headings: &[String]) -> Vec<Span<'r>> {
    let cutoff = heading_cutoff(line, headings);
    let mut spans: Vec<Span<'r>> = Vec::new();
    for rule in rules.iter() {
        for found in rule.pattern().find_iter(line) {
            let (start, end) = (found.start(), found.end());
            if cutoff.is_some_and(|limit| start >= limit) {
                continue;
            }
            if !word_bounded(line, start, end) {
                continue;
            }
            if spans.iter().any(|span| span.start < end && start < span.end) {
                continue;
            }
            spans.push(Span { start, end, rule });
        }
    }
    spans.sort_by_key(|span| span.start);
    spans
}

/// Apply `spans` to `line`, returning the rewritten text.
///
/// Spans must come from [`scan_line`] over the same line. Replacements
/// are applied back to front so earlier offsets stay valid while later
/// text shifts.
#[must_use]
pub fn apply_spans(line: &str, spans: &[Span<'_>]) -> String {
    let mut ordered: Vec<Span<'_>> = spans.to_vec();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));
    let mut result = line.to_string();
    for span in ordered {
        result.replace_range(span.start..span.end, span.destination());
    }
    result
}

/// Byte offset of the earliest heading marker in `line`, if any occurs.
fn heading_cutoff(line: &str, headings: &[String]) -> Option<usize> {
    headings
        .iter()
        .filter_map(|heading| line.find(heading.as_str()))
        .min()
}

/// Whether the match at `start..end` stands alone as a word.
pub(crate) fn word_bounded(line: &str, start: usize, end: usize) -> bool {
    let before = line.get(..start).and_then(|prefix| prefix.chars().next_back());
    let after = line.get(end..).and_then(|suffix| suffix.chars().next());
    !before.is_some_and(binds_left) && !after.is_some_and(binds_right)
}

/// Characters that glue a match to the text before it.
fn binds_left(ch: char) -> bool {
    ch == '_' || ch == '<' || ch.is_ascii_alphanumeric()
}

/// Characters that glue a match to the text after it.
fn binds_right(ch: char) -> bool {
    ch == '_' || ch == '>' || ch.is_ascii_alphanumeric()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests scan with known-good rule sets")]
mod tests {
    use rstest::rstest;

    use crate::config::LineMap;
    use crate::rules::RuleSet;

    use super::*;

    fn rules(swap_value: &str) -> RuleSet {
        RuleSet::compile(swap_value, &LineMap::default()).unwrap()
    }

    fn rewrite(line: &str, swap_value: &str) -> String {
        let rules = rules(swap_value);
        let spans = scan_line(line, &rules, &[]);
        apply_spans(line, &spans)
    }

    #[rstest]
    #[case("u32 count;", "uint32_t count;")]
    #[case("u32 u32", "uint32_t uint32_t")]
    #[case("(u32)x", "(uint32_t)x")]
    #[case("u32* ptr", "uint32_t* ptr")]
    #[case("a_u32 stays", "a_u32 stays")]
    #[case("u32x stays", "u32x stays")]
    #[case("xu32 stays", "xu32 stays")]
    #[case("vector<u32> stays", "vector<u32> stays")]
    #[case("u32>shifted stays", "u32>shifted stays")]
    #[case("u32", "uint32_t")]
    fn word_boundaries_are_respected(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(rewrite(line, "u32/uint32_t"), expected);
    }

    #[test]
    fn longer_sources_win_overlaps() {
        let rewritten = rewrite("unsigned long a; long b;", "unsigned long/u64, long/i64");
        assert_eq!(rewritten, "u64 a; i64 b;");
    }

    #[test]
    fn overlapping_shorter_match_is_suppressed_not_shifted() {
        // `long` also occurs inside `unsigned long`; the longer rule claims
        // the region and the shorter match inside it is dropped entirely.
        let rules = rules("unsigned long/u64, long/i64");
        let spans = scan_line("unsigned long x;", &rules, &[]);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].source(), "unsigned long");
    }

    #[test]
    fn spans_are_sorted_by_start() {
        let rules = rules("beta/B, alpha/A");
        let spans = scan_line("alpha beta alpha", &rules, &[]);
        let starts: Vec<usize> = spans.iter().map(Span::start).collect();
        assert_eq!(starts, vec![0, 6, 11]);
    }

    #[test]
    fn heading_cuts_off_the_rest_of_the_line() {
        let rules = rules("u32/uint32_t");
        let headings = vec!["// KEEP".to_string()];
        let line = "u32 a; // KEEP u32 b;";
        let spans = scan_line(line, &rules, &headings);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start(), 0);
        assert_eq!(apply_spans(line, &spans), "uint32_t a; // KEEP u32 b;");
    }

    #[test]
    fn heading_at_line_start_suppresses_everything() {
        let rules = rules("u32/uint32_t");
        let headings = vec!["//".to_string()];
        assert!(scan_line("// u32 here", &rules, &headings).is_empty());
    }

    #[test]
    fn earliest_of_several_headings_wins() {
        let rules = rules("u32/uint32_t");
        let headings = vec!["// B".to_string(), "// A".to_string()];
        let line = "u32 x; // A u32 // B u32";
        let spans = scan_line(line, &rules, &headings);
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn replacements_of_different_lengths_stay_aligned() {
        let rewritten = rewrite("map<int,int> m; int n;", "int/i32");
        // `int` inside `map<...>` sits next to `<`; only the bare one moves.
        assert_eq!(rewritten, "map<int,int> m; i32 n;");
    }

    #[test]
    fn multiple_rules_interleave_on_one_line() {
        let rewritten = rewrite("u8 a; u16 b; u8 c;", "u8/uint8_t, u16/uint16_t");
        assert_eq!(rewritten, "uint8_t a; uint16_t b; uint8_t c;");
    }

    #[test]
    fn empty_rule_set_leaves_lines_alone() {
        let rules = RuleSet::default();
        assert!(scan_line("u32 x;", &rules, &[]).is_empty());
    }
}
