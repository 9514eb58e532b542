//! Direct identifier-to-path table
//!
//! The class map is the fastest and most authoritative resolution
//! source: a lookup either names the exact file to materialize or the
//! strategy chain moves on. Keys are stored lowercased; callers hand in
//! raw identifiers.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Mapping from normalized identifier to absolute unit path.
#[derive(Debug, Default)]
pub struct ClassMap {
    entries: IndexMap<String, PathBuf>,
}

impl ClassMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `identifier -> path`, lowercasing the key. An existing
    /// entry is only overwritten when `force` is set. Returns whether
    /// the map changed.
    pub fn insert(&mut self, identifier: &str, path: &Path, force: bool) -> bool {
        let key = identifier.to_lowercase();
        if !force && self.entries.contains_key(&key) {
            trace!("Keeping existing class map entry for {}", key);
            return false;
        }
        self.entries.insert(key, path.to_path_buf());
        true
    }

    /// Look up the path registered for `identifier`.
    pub fn get(&self, identifier: &str) -> Option<&Path> {
        self.entries
            .get(&identifier.to_lowercase())
            .map(PathBuf::as_path)
    }

    /// Whether `identifier` has a registered path.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(&identifier.to_lowercase())
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
    }
}
