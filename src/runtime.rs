//! Host runtime seam
//!
//! The loader never executes compiled units itself; it hands paths to
//! the host process through [`HostRuntime`] and queries the host for
//! which symbols are already live. [`MemoryRuntime`] is a
//! manifest-driven in-memory host for tests and embeddings that have no
//! real execution primitive.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Operations the loader needs from the host process.
pub trait HostRuntime {
    /// Load and execute the compiled unit at `path`, making its
    /// top-level symbols globally visible. Returns `false` when the
    /// unit could not be read or executed. Idempotent for units whose
    /// symbols are already materialized.
    fn materialize(&mut self, path: &Path) -> bool;

    /// Whether `name` is already materialized in the host.
    fn is_defined(&self, name: &str) -> bool;

    /// Make `alias` resolve to the same entity as `canonical`.
    /// Returns `false` if `alias` is already bound to something else.
    fn bind_synonym(&mut self, canonical: &str, alias: &str) -> bool;
}

/// In-memory host runtime.
///
/// Units are described by a manifest: registering a path with a list of
/// symbol names means "executing this unit defines these names". This
/// is enough to exercise every loader strategy without a language
/// runtime behind it.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    manifest: FxHashMap<PathBuf, Vec<String>>,
    failing: FxHashSet<PathBuf>,
    defined: FxHashSet<String>,
    synonyms: FxHashMap<String, String>,
    materialized: usize,
}

impl MemoryRuntime {
    /// Create an empty runtime with no units and no defined symbols.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that materializing `path` defines the given symbols.
    pub fn provide_unit(&mut self, path: impl Into<PathBuf>, symbols: &[&str]) {
        self.manifest
            .insert(path.into(), symbols.iter().map(|s| s.to_string()).collect());
    }

    /// Pre-define a symbol, as if its unit had already been executed.
    pub fn define(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }

    /// Declare that materializing `path` fails even though the file
    /// exists, as a unit that cannot be executed would.
    pub fn fail_unit(&mut self, path: impl Into<PathBuf>) {
        self.failing.insert(path.into());
    }

    /// The canonical target of a synonym, if `name` was bound as one.
    pub fn synonym_target(&self, name: &str) -> Option<&str> {
        self.synonyms.get(name).map(String::as_str)
    }

    /// How many units have been materialized so far.
    pub fn materialized_count(&self) -> usize {
        self.materialized
    }
}

impl HostRuntime for MemoryRuntime {
    fn materialize(&mut self, path: &Path) -> bool {
        if !path.exists() {
            trace!("Materialize miss, no file at {:?}", path);
            return false;
        }
        if self.failing.contains(path) {
            debug!("Unit {:?} failed to execute", path);
            return false;
        }
        self.materialized += 1;
        if let Some(symbols) = self.manifest.get(path) {
            for symbol in symbols {
                self.defined.insert(symbol.clone());
            }
            debug!("Materialized unit {:?}", path);
        } else {
            // A unit with no manifest entry executes but defines nothing.
            debug!("Materialized unit {:?} with no declared symbols", path);
        }
        true
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name) || self.synonyms.contains_key(name)
    }

    fn bind_synonym(&mut self, canonical: &str, alias: &str) -> bool {
        if self.defined.contains(alias) {
            return false;
        }
        if let Some(existing) = self.synonyms.get(alias) {
            return existing == canonical;
        }
        self.synonyms
            .insert(alias.to_string(), canonical.to_string());
        debug!("Bound synonym {} -> {}", alias, canonical);
        true
    }
}
