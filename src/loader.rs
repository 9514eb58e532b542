//! The resolver context and strategy chain
//!
//! A [`Loader`] owns every routing table plus the host-runtime handle,
//! and dispatches resolution requests through an ordered list of
//! strategies. Order is data: `setup` installs a subset of the fixed
//! chain and tests may install any order they like.

use crate::alias::{AliasGraph, DeprecatedAlias};
use crate::classmap::ClassMap;
use crate::error::{LoaderError, Result};
use crate::ident::{self, SEPARATOR};
use crate::paths::PathTable;
use crate::runtime::HostRuntime;
use crate::scan::{self, ScanError};
use crate::LoaderConfig;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, trace, warn};

/// The two recognized hierarchical namespace conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamespaceVariant {
    /// Legacy convention: the namespace path is appended in full under
    /// each root, and underscores in the unit name become directories.
    V0,
    /// Current convention: the matched namespace prefix is replaced by
    /// the root, and the unit name is used verbatim.
    V4,
}

impl NamespaceVariant {
    /// The registration tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceVariant::V0 => "v0",
            NamespaceVariant::V4 => "v4",
        }
    }
}

impl FromStr for NamespaceVariant {
    type Err = LoaderError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "v0" => Ok(NamespaceVariant::V0),
            "v4" => Ok(NamespaceVariant::V4),
            other => Err(LoaderError::InvalidVariant {
                variant: other.to_string(),
            }),
        }
    }
}

/// A single resolution strategy in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct class map lookup, cheapest and most authoritative
    ClassMap,
    /// Legacy prefix + camelCase convention
    Prefix,
    /// Hierarchical namespaces, legacy convention
    NamespaceV0,
    /// Hierarchical namespaces, current convention
    NamespaceV4,
    /// Extension-layout prober; registers a v4 namespace on success
    ExtensionProbe,
    /// Alias indirection through the canonical identifier
    Alias,
}

/// The resolver context: all routing tables, the strategy chain, and
/// the host runtime.
///
/// Every operation takes `&mut self`; resolution performs
/// lookup-then-insert sequences and the import memo promises at most
/// one attempt per key, so a multi-threaded embedding must funnel all
/// calls through one owner or a single coarse lock.
pub struct Loader<R: HostRuntime> {
    config: LoaderConfig,
    runtime: R,
    class_map: ClassMap,
    prefixes: PathTable,
    namespaces_v0: PathTable,
    namespaces_v4: PathTable,
    aliases: AliasGraph,
    extension_roots: FxHashMap<String, PathBuf>,
    imported: FxHashMap<String, bool>,
    resolving: FxHashSet<String>,
    strategies: Vec<Strategy>,
}

impl<R: HostRuntime> Loader<R> {
    /// Create a loader with no strategies installed. Call [`setup`]
    /// (or [`set_strategies`]) before resolving.
    ///
    /// [`setup`]: Loader::setup
    /// [`set_strategies`]: Loader::set_strategies
    pub fn new(config: LoaderConfig, runtime: R) -> Self {
        Self {
            config,
            runtime,
            class_map: ClassMap::new(),
            prefixes: PathTable::new(),
            namespaces_v0: PathTable::new(),
            namespaces_v4: PathTable::new(),
            aliases: AliasGraph::new(),
            extension_roots: FxHashMap::default(),
            imported: FxHashMap::default(),
            resolving: FxHashSet::default(),
            strategies: Vec::new(),
        }
    }

    /// Install the strategy chain. The relative order is fixed: class
    /// map, prefix, namespace v0, namespace v4, extension probe, alias;
    /// the flags select which parts are present. The convention flag
    /// covers both namespace variants, the prober, and alias
    /// indirection.
    pub fn setup(&mut self, conventions: bool, prefixes: bool, classmap: bool) {
        let mut strategies = Vec::new();
        if classmap {
            strategies.push(Strategy::ClassMap);
        }
        if prefixes {
            strategies.push(Strategy::Prefix);
        }
        if conventions {
            strategies.push(Strategy::NamespaceV0);
            strategies.push(Strategy::NamespaceV4);
            strategies.push(Strategy::ExtensionProbe);
            strategies.push(Strategy::Alias);
        }
        debug!("Installed strategies: {:?}", strategies);
        self.strategies = strategies;
    }

    /// Replace the strategy chain wholesale.
    pub fn set_strategies(&mut self, strategies: Vec<Strategy>) {
        self.strategies = strategies;
    }

    /// The installed strategies, in dispatch order.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// The host runtime.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The host runtime, mutably.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    // ---- registration ----------------------------------------------

    /// Register a direct identifier-to-path mapping.
    ///
    /// Best-effort: an empty identifier or a missing file is a silent
    /// no-op. When `identifier` is a registered alias, its canonical
    /// identifier is registered first with the same path and flag.
    /// An existing entry is only overwritten when `force` is set.
    pub fn register_class(&mut self, identifier: &str, path: &Path, force: bool) {
        if identifier.is_empty() {
            return;
        }
        if !scan::file_exists(path) {
            trace!("Ignoring class registration for {} at missing {:?}", identifier, path);
            return;
        }
        if let Some(canonical) = self.aliases.canonical_of(identifier).map(str::to_string) {
            self.register_class(&canonical, path, force);
        }
        self.class_map.insert(identifier, path, force);
    }

    /// Scan `root` for unit files and register each under
    /// `prefix + filename-stem`, lowercased. A missing or non-directory
    /// root is a no-op; other listing failures are logged and treated
    /// as empty.
    pub fn discover_classes(&mut self, prefix: &str, root: &Path, force: bool, recurse: bool) {
        let files = match scan::list_directory(root, recurse) {
            Ok(files) => files,
            Err(ScanError::NotADirectory { .. }) => return,
            Err(err @ ScanError::Io { .. }) => {
                warn!("Discovery under {:?} failed: {}", root, err);
                return;
            }
        };
        for file in files {
            if file.extension().and_then(|e| e.to_str()) != Some(self.config.unit_extension.as_str())
            {
                continue;
            }
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let identifier = format!("{}{}", prefix, stem).to_lowercase();
            self.register_class(&identifier, &file, force);
        }
    }

    /// Register a search root for a legacy prefix. Fails with
    /// [`LoaderError::PathNotFound`] when `root` does not exist.
    pub fn register_prefix(
        &mut self,
        prefix: &str,
        root: &Path,
        reset: bool,
        prepend: bool,
    ) -> Result<()> {
        self.check_root(root)?;
        self.prefixes.add(prefix, root, reset, prepend);
        debug!("Registered prefix {} at {:?}", prefix, root);
        Ok(())
    }

    /// Register a search root for a hierarchical namespace under the
    /// given convention. Fails with [`LoaderError::PathNotFound`] when
    /// `root` does not exist.
    pub fn register_namespace(
        &mut self,
        namespace: &str,
        root: &Path,
        reset: bool,
        prepend: bool,
        variant: NamespaceVariant,
    ) -> Result<()> {
        self.check_root(root)?;
        self.namespace_table_mut(variant)
            .add(namespace, root, reset, prepend);
        debug!(
            "Registered {} namespace {} at {:?}",
            variant.as_str(),
            namespace,
            root
        );
        Ok(())
    }

    /// Register an alias for a canonical identifier. Aliases are
    /// write-once; a second registration for the same alias returns
    /// `false` and keeps the original target. A `version` marks the
    /// alias deprecated as of that version.
    pub fn register_alias(&mut self, alias: &str, canonical: &str, version: Option<&str>) -> bool {
        self.aliases.insert(alias, canonical, version)
    }

    /// Register a deployment-area root for the extension prober. The
    /// plugin kind is cross-cutting and uses the empty-string key.
    /// Roots registered here are not validated; the prober checks disk
    /// at resolution time.
    pub fn register_extension_root(&mut self, key: &str, root: &Path) {
        self.extension_roots.insert(key.to_string(), root.to_path_buf());
    }

    // ---- inspection ------------------------------------------------

    /// Whether `identifier` has a class map entry.
    pub fn is_registered_class(&self, identifier: &str) -> bool {
        self.class_map.contains(identifier)
    }

    /// All class map entries, in registration order.
    pub fn class_map(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.class_map.entries()
    }

    /// The namespaces registered under `variant`, with their roots in
    /// search order.
    pub fn namespaces(&self, variant: NamespaceVariant) -> &IndexMap<String, Vec<PathBuf>> {
        match variant {
            NamespaceVariant::V0 => self.namespaces_v0.entries(),
            NamespaceVariant::V4 => self.namespaces_v4.entries(),
        }
    }

    /// The append-only deprecation log.
    pub fn deprecated_aliases(&self) -> &[DeprecatedAlias] {
        self.aliases.deprecated()
    }

    // ---- resolution ------------------------------------------------

    /// Resolve `identifier` through the installed strategy chain.
    /// Returns `true` as soon as one strategy locates and loads the
    /// unit (or, for the alias strategy, force-resolves the canonical
    /// identifier). A miss across the whole chain is `false`.
    pub fn resolve(&mut self, identifier: &str) -> bool {
        if self.resolving.contains(identifier) {
            trace!("Already resolving {}, breaking re-entry", identifier);
            return false;
        }
        self.resolving.insert(identifier.to_string());
        let found = self.dispatch(identifier);
        self.resolving.remove(identifier);
        found
    }

    fn dispatch(&mut self, identifier: &str) -> bool {
        for strategy in self.strategies.clone() {
            let found = match strategy {
                Strategy::ClassMap => self.load_mapped(identifier),
                Strategy::Prefix => self.load_by_prefix(identifier),
                Strategy::NamespaceV0 => self.load_by_namespace_v0(identifier),
                Strategy::NamespaceV4 => self.load_by_namespace_v4(identifier),
                Strategy::ExtensionProbe => self.load_by_extension_probe(identifier),
                Strategy::Alias => self.load_by_alias(identifier),
            };
            if found {
                trace!("Resolved {} via {:?}", identifier, strategy);
                return true;
            }
        }
        false
    }

    /// One-shot import of a coarse-grained library by dotted key.
    ///
    /// The key maps to `base/a/b/c.<ext>`, falling back to the doubled
    /// `base/a/b/c/c.<ext>` layout. Each key is attempted at most once
    /// per loader lifetime; repeated calls return the memoized result
    /// without touching the filesystem.
    pub fn import_library(&mut self, key: &str, base: Option<&Path>) -> bool {
        if let Some(&memoized) = self.imported.get(key) {
            trace!("Import memo hit for {}: {}", key, memoized);
            return memoized;
        }
        let base = base.unwrap_or(&self.config.base_dir);
        let rel: String = key
            .split(SEPARATOR)
            .collect::<Vec<_>>()
            .join(std::path::MAIN_SEPARATOR_STR);
        let mut candidate = base.join(format!("{}.{}", rel, self.config.unit_extension));
        if !scan::file_exists(&candidate) {
            let name = ident::split_last(key).1;
            candidate = base
                .join(&rel)
                .join(format!("{}.{}", name, self.config.unit_extension));
        }
        let success = scan::file_exists(&candidate) && self.runtime.materialize(&candidate);
        if success {
            info!("Imported library {} from {:?}", key, candidate);
        } else {
            debug!("Import of library {} failed", key);
        }
        self.imported.insert(key.to_string(), success);
        success
    }

    // ---- strategies ------------------------------------------------

    /// Class map strategy. Short-circuits when the host already has the
    /// identifier; otherwise materializes the mapped file and, if the
    /// file defined only the canonical name of an alias identifier,
    /// binds the alias to the now-defined canonical without a second
    /// load.
    fn load_mapped(&mut self, identifier: &str) -> bool {
        if self.runtime.is_defined(identifier) {
            return true;
        }
        let Some(path) = self.class_map.get(identifier).map(Path::to_path_buf) else {
            return false;
        };
        let found = self.runtime.materialize(&path);
        if found {
            info!("Loaded {} from {:?}", identifier, path);
            self.propagate_aliases(identifier);
            if !self.runtime.is_defined(identifier) {
                if let Some(canonical) =
                    self.aliases.canonical_of(identifier).map(str::to_string)
                {
                    if self.runtime.is_defined(&canonical) {
                        self.runtime.bind_synonym(&canonical, identifier);
                    }
                }
            }
        }
        found
    }

    /// Prefix strategy. A prefix matches when the identifier starts
    /// with it and continues with an uppercase character; the remainder
    /// is camel-split into lowercase path segments under each root.
    fn load_by_prefix(&mut self, identifier: &str) -> bool {
        let prefixes: Vec<(String, Vec<PathBuf>)> = self
            .prefixes
            .entries()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        'prefixes: for (prefix, roots) in prefixes {
            let Some(rest) = identifier.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if !rest.chars().next().is_some_and(char::is_uppercase) {
                continue;
            }
            let segments = ident::camel_split(rest);
            if segments.is_empty() {
                continue;
            }
            let ext = &self.config.unit_extension;
            let mut relatives = vec![format!("{}.{}", segments.join("/"), ext)];
            if segments.len() == 1 {
                // Legacy single-segment layout: the file lives in a
                // directory of the same name.
                relatives.push(format!("{0}/{0}.{1}", segments[0], ext));
            }
            for root in &roots {
                for relative in &relatives {
                    let candidate = root.join(relative);
                    if scan::file_exists(&candidate) {
                        let found = self.runtime.materialize(&candidate);
                        if found {
                            debug!("Loaded {} via prefix {} from {:?}", identifier, prefix, candidate);
                            self.propagate_aliases(identifier);
                            return true;
                        }
                        // First existing file settles this prefix; a
                        // failed load must not fall through to copies
                        // under later roots.
                        continue 'prefixes;
                    }
                }
            }
        }
        false
    }

    /// Namespace strategy, legacy convention: the full namespace path
    /// is appended under each root and underscores in the unit name
    /// become directory separators.
    fn load_by_namespace_v0(&mut self, identifier: &str) -> bool {
        let (namespace_path, unit) = ident::split_last(identifier);
        let mut relative = namespace_path.replace(SEPARATOR, "/");
        if !relative.is_empty() {
            relative.push('/');
        }
        relative.push_str(&unit.replace('_', "/"));
        relative.push('.');
        relative.push_str(&self.config.unit_extension);

        let candidates = self.matching_roots(NamespaceVariant::V0, identifier);
        for (_, roots) in candidates {
            for root in roots {
                let candidate = root.join(&relative);
                if scan::file_exists(&candidate) && !self.runtime.is_defined(identifier) {
                    return self.materialize_and_propagate(identifier, &candidate);
                }
            }
        }
        false
    }

    /// Namespace strategy, current convention: the matched namespace
    /// prefix is replaced by the root; the rest of the identifier maps
    /// verbatim onto the path.
    pub(crate) fn load_by_namespace_v4(&mut self, identifier: &str) -> bool {
        let candidates = self.matching_roots(NamespaceVariant::V4, identifier);
        for (namespace, roots) in candidates {
            if identifier.len() <= namespace.len()
                || !identifier[namespace.len()..].starts_with(SEPARATOR)
            {
                continue;
            }
            let relative = format!(
                "{}.{}",
                identifier[namespace.len() + 1..].replace(SEPARATOR, "/"),
                self.config.unit_extension
            );
            for root in roots {
                let candidate = root.join(&relative);
                if scan::file_exists(&candidate) && !self.runtime.is_defined(identifier) {
                    return self.materialize_and_propagate(identifier, &candidate);
                }
            }
        }
        false
    }

    /// Alias strategy: force-resolve the canonical identifier through
    /// the whole chain, then bind this identifier as a synonym if the
    /// host did not pick it up along the way.
    fn load_by_alias(&mut self, identifier: &str) -> bool {
        let Some(canonical) = self.aliases.canonical_of(identifier).map(str::to_string) else {
            return false;
        };
        if !self.runtime.is_defined(&canonical) {
            self.resolve(&canonical);
        }
        if !self.runtime.is_defined(&canonical) {
            return false;
        }
        if !self.runtime.is_defined(identifier) {
            self.runtime.bind_synonym(&canonical, identifier);
        }
        true
    }

    // ---- shared plumbing -------------------------------------------

    /// Force-resolve every alias of a just-loaded identifier so each
    /// becomes a usable synonym.
    pub(crate) fn propagate_aliases(&mut self, identifier: &str) {
        let canonical = ident::trim_leading_separator(identifier);
        let aliases: Vec<String> = self.aliases.aliases_of(canonical).to_vec();
        for alias in aliases {
            if !self.runtime.is_defined(&alias) {
                trace!("Propagating load of {} to alias {}", canonical, alias);
                self.resolve(&alias);
            }
        }
    }

    pub(crate) fn materialize_and_propagate(&mut self, identifier: &str, path: &Path) -> bool {
        let found = self.runtime.materialize(path);
        if found {
            debug!("Loaded {} from {:?}", identifier, path);
            self.propagate_aliases(identifier);
        }
        found
    }

    /// Namespaces of the given variant that are string-prefixes of the
    /// identifier, with their roots, in registration order.
    fn matching_roots(
        &self,
        variant: NamespaceVariant,
        identifier: &str,
    ) -> Vec<(String, Vec<PathBuf>)> {
        let table = match variant {
            NamespaceVariant::V0 => &self.namespaces_v0,
            NamespaceVariant::V4 => &self.namespaces_v4,
        };
        table
            .entries()
            .iter()
            .filter(|(namespace, _)| identifier.starts_with(namespace.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn namespace_table_mut(&mut self, variant: NamespaceVariant) -> &mut PathTable {
        match variant {
            NamespaceVariant::V0 => &mut self.namespaces_v0,
            NamespaceVariant::V4 => &mut self.namespaces_v4,
        }
    }

    pub(crate) fn extension_root(&self, key: &str) -> Option<&Path> {
        self.extension_roots.get(key).map(PathBuf::as_path)
    }

    fn check_root(&self, root: &Path) -> Result<()> {
        if root.exists() {
            return Ok(());
        }
        let shown = root
            .strip_prefix(&self.config.base_dir)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| rel.display().to_string())
            .or_else(|| {
                root.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| root.display().to_string());
        Err(LoaderError::PathNotFound { path: shown })
    }
}
