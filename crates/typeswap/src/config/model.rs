//! Parsed configuration model.

use std::collections::HashMap;

use super::{split_quoted_list, strip_quotes};

/// Keys whose repeated assignments accumulate instead of overwriting.
const MULTI_VALUED_KEYS: [&str; 5] = ["Folder", "Files", "ExcludeFile", "ExcludeHeading", "Swap"];

/// First-occurrence line numbers for non-empty configuration lines.
///
/// Swap entries are split out of an accumulated value long after parsing,
/// so errors against an entry look its original line up here. Repeated
/// identical lines keep the first number, which is also the occurrence a
/// duplicate-source error wants to point at.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    entries: HashMap<String, usize>,
}

impl LineMap {
    pub(crate) fn record(&mut self, line: &str, number: usize) {
        self.entries.entry(line.to_string()).or_insert(number);
    }

    /// The line number `text` first appeared on, if it was seen at all.
    #[must_use]
    pub fn line_of(&self, text: &str) -> Option<usize> {
        self.entries.get(text).copied()
    }
}

/// Key/value view of a parsed configuration file.
///
/// Multi-valued keys (`Folder`, `Files`, `ExcludeFile`, `ExcludeHeading`,
/// `Swap`) accumulate comma-joined values across assignments; any other
/// key keeps its last assignment.
#[derive(Debug, Default)]
pub struct Config {
    values: HashMap<String, String>,
    line_map: LineMap,
}

impl Config {
    /// Raw accumulated value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Folders to search, in first-seen order.
    #[must_use]
    pub fn folders(&self) -> Vec<String> {
        self.list_values("Folder")
    }

    /// Filename globs selecting which files to process.
    #[must_use]
    pub fn file_patterns(&self) -> Vec<String> {
        self.list_values("Files")
    }

    /// Filename globs excluding files from processing.
    #[must_use]
    pub fn exclude_patterns(&self) -> Vec<String> {
        self.list_values("ExcludeFile")
    }

    /// Markers that cut substitution off for the rest of a line.
    #[must_use]
    pub fn exclude_headings(&self) -> Vec<String> {
        self.list_values("ExcludeHeading")
    }

    /// The accumulated swap value, uncompiled.
    #[must_use]
    pub fn swap_value(&self) -> Option<&str> {
        self.get("Swap")
    }

    /// Line numbers recorded while parsing.
    #[must_use]
    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Comma-split, trimmed, unquoted and deduplicated values for `key`.
    fn list_values(&self, key: &str) -> Vec<String> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        let mut items: Vec<String> = Vec::new();
        for part in split_quoted_list(raw) {
            let item = strip_quotes(part.trim());
            if !item.is_empty() && !items.iter().any(|seen| seen == item) {
                items.push(item.to_string());
            }
        }
        items
    }

    pub(crate) fn record_line(&mut self, line: &str, number: usize) {
        self.line_map.record(line, number);
    }

    pub(crate) fn merge_value(&mut self, key: &str, value: &str) {
        use std::collections::hash_map::Entry;

        if MULTI_VALUED_KEYS.contains(&key) {
            match self.values.entry(key.to_string()) {
                Entry::Occupied(mut slot) => {
                    if value.is_empty() {
                        return;
                    }
                    let joined = slot.get_mut();
                    if !joined.is_empty() {
                        joined.push_str(", ");
                    }
                    joined.push_str(value);
                }
                Entry::Vacant(slot) => {
                    slot.insert(value.to_string());
                }
            }
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
    }

    pub(crate) fn append_swap_entry(&mut self, entry: &str) {
        self.merge_value("Swap", entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_valued_keys_accumulate() {
        let mut config = Config::default();
        config.merge_value("Folder", "src");
        config.merge_value("Folder", "include");
        assert_eq!(config.get("Folder"), Some("src, include"));
        assert_eq!(config.folders(), vec!["src", "include"]);
    }

    #[test]
    fn scalar_keys_keep_the_last_assignment() {
        let mut config = Config::default();
        config.merge_value("Mode", "fast");
        config.merge_value("Mode", "careful");
        assert_eq!(config.get("Mode"), Some("careful"));
    }

    #[test]
    fn list_values_deduplicate_preserving_order() {
        let mut config = Config::default();
        config.merge_value("Files", "*.h, *.cpp");
        config.merge_value("Files", "*.h");
        assert_eq!(config.file_patterns(), vec!["*.h", "*.cpp"]);
    }

    #[test]
    fn quoted_values_keep_inner_spacing() {
        let mut config = Config::default();
        config.merge_value("ExcludeHeading", "\"// keep \"");
        assert_eq!(config.exclude_headings(), vec!["// keep "]);
    }

    #[test]
    fn empty_values_are_dropped_from_lists() {
        let mut config = Config::default();
        config.merge_value("Folder", "src, , include,");
        assert_eq!(config.folders(), vec!["src", "include"]);
    }

    #[test]
    fn line_map_keeps_first_occurrence() {
        let mut map = LineMap::default();
        map.record("u32/uint32_t", 3);
        map.record("u32/uint32_t", 9);
        assert_eq!(map.line_of("u32/uint32_t"), Some(3));
        assert_eq!(map.line_of("never seen"), None);
    }
}
