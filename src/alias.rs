//! Alias graph
//!
//! Aliases are write-once: the first registration for an alias name
//! wins and later attempts are reported back as failures. The inverse
//! index (canonical name to its aliases) is maintained inside the same
//! insert so the two maps can never disagree.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A deprecation record for an alias, kept for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeprecatedAlias {
    /// The alias name
    pub alias: String,
    /// The canonical name it points at
    pub canonical: String,
    /// Version the alias was deprecated as of
    pub version: String,
}

/// Bidirectional alias bookkeeping: one alias maps to exactly one
/// canonical name; a canonical name may have many aliases.
#[derive(Debug, Default)]
pub struct AliasGraph {
    canonical_of: FxHashMap<String, String>,
    aliases_of: FxHashMap<String, Vec<String>>,
    deprecated: Vec<DeprecatedAlias>,
}

impl AliasGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias -> canonical`, updating both directions in one
    /// step. Returns `false` without touching anything if `alias`
    /// already has a mapping. A `version` marks the alias deprecated as
    /// of that version.
    pub fn insert(&mut self, alias: &str, canonical: &str, version: Option<&str>) -> bool {
        if self.canonical_of.contains_key(alias) {
            debug!("Alias {} already registered, keeping existing target", alias);
            return false;
        }
        self.canonical_of
            .insert(alias.to_string(), canonical.to_string());
        self.aliases_of
            .entry(canonical.to_string())
            .or_default()
            .push(alias.to_string());
        if let Some(version) = version {
            self.deprecated.push(DeprecatedAlias {
                alias: alias.to_string(),
                canonical: canonical.to_string(),
                version: version.to_string(),
            });
        }
        true
    }

    /// The canonical name `alias` points at, if any.
    pub fn canonical_of(&self, alias: &str) -> Option<&str> {
        self.canonical_of.get(alias).map(String::as_str)
    }

    /// All aliases registered for `canonical`.
    pub fn aliases_of(&self, canonical: &str) -> &[String] {
        self.aliases_of
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The append-only deprecation log.
    pub fn deprecated(&self) -> &[DeprecatedAlias] {
        &self.deprecated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_is_write_once() {
        let mut graph = AliasGraph::new();

        assert!(graph.insert("Old", "New", None));
        assert!(!graph.insert("Old", "Other", None));
        assert_eq!(graph.canonical_of("Old"), Some("New"));
    }

    #[test]
    fn test_inverse_index_tracks_inserts() {
        let mut graph = AliasGraph::new();
        graph.insert("A", "Canon", None);
        graph.insert("B", "Canon", None);

        assert_eq!(graph.aliases_of("Canon"), &["A", "B"]);
        assert!(graph.aliases_of("Other").is_empty());
    }

    #[test]
    fn test_deprecation_log_is_append_only() {
        let mut graph = AliasGraph::new();
        graph.insert("A", "Canon", Some("4.0"));
        graph.insert("B", "Canon", None);
        // Failed re-registration must not add a record
        graph.insert("A", "Elsewhere", Some("5.0"));

        assert_eq!(graph.deprecated().len(), 1);
        assert_eq!(
            graph.deprecated()[0],
            DeprecatedAlias {
                alias: "A".to_string(),
                canonical: "Canon".to_string(),
                version: "4.0".to_string(),
            }
        );
    }
}
