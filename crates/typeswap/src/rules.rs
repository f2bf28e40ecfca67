//! Swap-rule compilation.
//!
//! The accumulated `Swap` value is a comma-joined list of entries in two
//! forms: `source/destination` pairs and C-style `typedef <type> <name>;`
//! declarations (which swap the type for the name). Compilation validates
//! every entry, rejects duplicate sources outright, escapes each source
//! into a literal pattern compiled exactly once, and orders rules by
//! descending source length so longer tokens win overlaps.

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{is_typedef, split_quoted_list, strip_quotes, LineMap};
use crate::errors::ConfigError;

static TYPEDEF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^typedef\s+(.+?)\s+(\w+)\s*;").unwrap_or_else(|_| unreachable!())
});

/// One compiled substitution rule.
#[derive(Debug, Clone)]
pub struct SwapRule {
    source: String,
    destination: String,
    pattern: Regex,
    line: Option<usize>,
}

impl SwapRule {
    /// The token to replace.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The replacement text.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The configuration line the rule came from, when known.
    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        self.line
    }

    pub(crate) fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// All rules for a run, ordered by descending source character length.
///
/// The ordering is part of the matching contract: scans walk the rules in
/// order, so a longer source claims its text before any shorter source
/// that overlaps it can. Entries whose sources tie on length keep their
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<SwapRule>,
}

impl RuleSet {
    /// Compile an accumulated `Swap` value into an ordered rule set.
    ///
    /// `line_map` resolves entries back to their configuration lines for
    /// error reporting; entries that arrived inline (on a `Swap = ...`
    /// key line) may have no resolvable line.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for entries without exactly one `/`,
    /// malformed `typedef` declarations, empty sources or destinations,
    /// and duplicate sources.
    pub fn compile(swap_value: &str, line_map: &LineMap) -> Result<Self, ConfigError> {
        let mut rules: Vec<SwapRule> = Vec::new();
        for segment in split_quoted_list(swap_value) {
            let entry = segment.trim();
            if entry.is_empty() {
                continue;
            }
            let line = entry_line(line_map, entry);
            let (source, destination) = parse_entry(entry, line)?;
            if let Some(existing) = rules.iter().find(|rule| rule.source == source) {
                return Err(ConfigError::DuplicateSwapSource {
                    source,
                    entry: entry.to_string(),
                    line_number: line,
                    first_line: existing.line,
                });
            }
            let pattern =
                Regex::new(&regex::escape(&source)).map_err(|error| ConfigError::RulePattern {
                    source: source.clone(),
                    error,
                })?;
            rules.push(SwapRule {
                source,
                destination,
                pattern,
                line,
            });
        }
        rules.sort_by_key(|rule| Reverse(rule.source.chars().count()));
        log::debug!("compiled {} swap rule(s)", rules.len());
        Ok(Self { rules })
    }

    /// Rules in matching order.
    pub fn iter(&self) -> std::slice::Iter<'_, SwapRule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'r> IntoIterator for &'r RuleSet {
    type Item = &'r SwapRule;
    type IntoIter = std::slice::Iter<'r, SwapRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Resolve an entry back to its configuration line.
///
/// In-block entries were recorded with their original trailing comma, so
/// look the bare text up first and fall back to the comma form.
fn entry_line(line_map: &LineMap, entry: &str) -> Option<usize> {
    line_map
        .line_of(entry)
        .or_else(|| line_map.line_of(&format!("{entry},")))
}

fn parse_entry(entry: &str, line: Option<usize>) -> Result<(String, String), ConfigError> {
    if is_typedef(entry) {
        return parse_typedef(entry, line);
    }
    let Some((raw_source, raw_destination)) = entry.split_once('/') else {
        return Err(ConfigError::MalformedSwapPair {
            entry: entry.to_string(),
            line_number: line,
        });
    };
    if raw_destination.contains('/') {
        return Err(ConfigError::MalformedSwapPair {
            entry: entry.to_string(),
            line_number: line,
        });
    }
    let source = strip_quotes(raw_source.trim());
    let destination = strip_quotes(raw_destination.trim());
    if source.is_empty() || destination.is_empty() {
        return Err(ConfigError::EmptySwapSide {
            entry: entry.to_string(),
            line_number: line,
        });
    }
    Ok((source.to_string(), destination.to_string()))
}

fn parse_typedef(entry: &str, line: Option<usize>) -> Result<(String, String), ConfigError> {
    let cleaned = strip_comment(entry);
    let Some(caps) = TYPEDEF_PATTERN.captures(cleaned) else {
        return Err(ConfigError::MalformedTypedef {
            entry: entry.to_string(),
            line_number: line,
        });
    };
    let source = caps.get(1).map_or("", |m| m.as_str()).trim();
    let destination = caps.get(2).map_or("", |m| m.as_str());
    if source.is_empty() || destination.is_empty() {
        return Err(ConfigError::EmptySwapSide {
            entry: entry.to_string(),
            line_number: line,
        });
    }
    Ok((source.to_string(), destination.to_string()))
}

/// Cut a trailing `//` or `/*` comment off an entry.
fn strip_comment(entry: &str) -> &str {
    let cut = match (entry.find("//"), entry.find("/*")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    match cut {
        Some(idx) => &entry[..idx],
        None => entry,
    }
}
