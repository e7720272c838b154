//! Source-location registry (ambient, see SPEC_FULL.md §4.8)
//!
//! The authoritative printable-location table lives upstream alongside the
//! trace producer (§2 item 1) and is shared by reference for the analyzer's
//! lifetime; it must not be mutated while the analyzer is running. This module
//! defines the trait at that seam plus one concrete, in-memory implementation
//! fed by the trace's `init` event, sufficient to run the analyzer end to end.

use crate::domain::types::SourceLocId;
use std::collections::HashMap;

/// Resolves an opaque [`SourceLocId`] to the printable string used in the
/// per-object JSON stream (§6.2).
pub trait SourceLocationRegistry {
    fn resolve(&self, id: SourceLocId) -> String;
}

/// A source-location registry backed by a flat in-memory map, populated from
/// the `init` event's `source_map` field plus the two well-known sentinels.
#[derive(Debug, Default)]
pub struct InMemorySourceMap {
    entries: HashMap<SourceLocId, String>,
}

impl InMemorySourceMap {
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(SourceLocId::UNKNOWN, "<unknown>".to_string());
        entries.insert(SourceLocId::REMOVE_FROM_DOM, "<remove-from-dom>".to_string());
        InMemorySourceMap { entries }
    }

    /// Load resolutions from a `source_map` JSON object whose keys are
    /// `"file_id:iid"` strings and whose values are the printable locations.
    ///
    /// Malformed keys are skipped rather than failing the run: a corrupt
    /// entry in an ambient lookup table is not a reason to abort an
    /// otherwise well-formed trace. An id with no entry at all resolves to
    /// its own `"file_id:iid"` form rather than failing the lookup.
    pub fn load_from_json(&mut self, source_map: &serde_json::Map<String, serde_json::Value>) {
        for (key, value) in source_map {
            let Some((file_id, iid)) = key.split_once(':') else { continue };
            let (Ok(file_id), Ok(iid)) = (file_id.parse::<i32>(), iid.parse::<i32>()) else {
                continue;
            };
            if let Some(resolved) = value.as_str() {
                self.entries.insert(SourceLocId::new(file_id, iid), resolved.to_string());
            }
        }
    }

    pub fn insert(&mut self, id: SourceLocId, resolved: impl Into<String>) {
        self.entries.insert(id, resolved.into());
    }
}

impl SourceLocationRegistry for InMemorySourceMap {
    fn resolve(&self, id: SourceLocId) -> String {
        self.entries
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{}:{}", id.file_id, id.iid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_sentinels() {
        let map = InMemorySourceMap::new();
        assert_eq!(map.resolve(SourceLocId::UNKNOWN), "<unknown>");
        assert_eq!(map.resolve(SourceLocId::REMOVE_FROM_DOM), "<remove-from-dom>");
    }

    #[test]
    fn resolves_loaded_entries() {
        let mut map = InMemorySourceMap::new();
        let mut json = serde_json::Map::new();
        json.insert("1:2".to_string(), serde_json::json!("app.js:10:3"));
        map.load_from_json(&json);
        assert_eq!(map.resolve(SourceLocId::new(1, 2)), "app.js:10:3");
    }

    #[test]
    fn unknown_id_synthesizes_placeholder() {
        let map = InMemorySourceMap::new();
        assert_eq!(map.resolve(SourceLocId::new(9, 9)), "9:9");
    }

    #[test]
    fn malformed_keys_are_skipped_not_fatal() {
        let mut map = InMemorySourceMap::new();
        let mut json = serde_json::Map::new();
        json.insert("not-a-loc".to_string(), serde_json::json!("whatever"));
        map.load_from_json(&json);
        assert_eq!(map.resolve(SourceLocId::new(1, 2)), "1:2");
    }
}
