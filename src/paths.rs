//! Ordered root tables
//!
//! Both the legacy prefix convention and the hierarchical namespace
//! conventions map a string key to an ordered list of filesystem roots.
//! Order is load-bearing twice over: keys are consulted in registration
//! order, and within a key the roots are searched head first, so a
//! prepended root wins over everything registered before it.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// A mapping from a prefix or namespace key to its search roots.
#[derive(Debug, Default)]
pub struct PathTable {
    entries: IndexMap<String, Vec<PathBuf>>,
}

impl PathTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `root` under `key`.
    ///
    /// `reset` replaces the key's list with just `root`; otherwise
    /// `prepend` inserts at the head (searched first) and the default
    /// appends to the tail (searched last). An absent key becomes a
    /// singleton list regardless of flags.
    pub fn add(&mut self, key: &str, root: &Path, reset: bool, prepend: bool) {
        match self.entries.get_mut(key) {
            Some(roots) if !reset => {
                if prepend {
                    roots.insert(0, root.to_path_buf());
                } else {
                    roots.push(root.to_path_buf());
                }
            }
            _ => {
                self.entries
                    .insert(key.to_string(), vec![root.to_path_buf()]);
            }
        }
    }

    /// The roots registered under `key`, in search order.
    pub fn roots(&self, key: &str) -> Option<&[PathBuf]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// All entries, in key registration order.
    pub fn entries(&self) -> &IndexMap<String, Vec<PathBuf>> {
        &self.entries
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
