//! Runtime class/unit resolution registry
//!
//! This crate locates and loads compiled units on first reference,
//! including:
//! - A direct class map, the fastest resolution source
//! - Legacy prefix and hierarchical namespace conventions (two variants)
//! - Alias indirection with deprecation record-keeping
//! - A convention-driven prober for dynamically deployed extensions
//! - A one-shot, memoized library import entry point
//!
//! All state lives in a single [`Loader`] value; resolution walks an
//! ordered strategy chain and stops at the first strategy that locates
//! and materializes a unit through the host runtime seam.

pub mod alias;
pub mod classmap;
pub mod error;
pub mod ident;
pub mod loader;
pub mod paths;
pub mod probe;
pub mod runtime;
pub mod scan;

pub use alias::DeprecatedAlias;
pub use error::{LoaderError, Result};
pub use loader::{Loader, NamespaceVariant, Strategy};
pub use runtime::{HostRuntime, MemoryRuntime};
pub use scan::ScanError;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Base directory: the default root for library imports, and the
    /// reference point for relativizing paths in error messages
    pub base_dir: PathBuf,

    /// File extension of compiled units
    pub unit_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            unit_extension: "unit".to_string(),
        }
    }
}
