//! Extension-layout prober
//!
//! Deeply-namespaced identifiers of the shape
//! `Vendor.Kind.Name.Area.Unit...` belong to dynamically deployed
//! extensions. The prober turns the deployment area into a filesystem
//! root via the extension root table, composes the conventional
//! directory for the extension kind, and registers the result as a v4
//! namespace before handing the identifier back to the v4 strategy.

use crate::ident::{self, SEPARATOR};
use crate::loader::Loader;
use crate::runtime::HostRuntime;
use tracing::{debug, trace};

/// The recognized extension kinds, matched against the identifier's
/// second segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionKind {
    Component,
    Module,
    Plugin,
}

impl ExtensionKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "Component" => Some(ExtensionKind::Component),
            "Module" => Some(ExtensionKind::Module),
            "Plugin" => Some(ExtensionKind::Plugin),
            _ => None,
        }
    }
}

impl<R: HostRuntime> Loader<R> {
    /// Extension-probe strategy. Applies only to identifiers with at
    /// least five segments whose second segment names an extension
    /// kind. On success a v4 namespace covering the first four segments
    /// is registered as a side effect, rooted at the probed directory.
    pub(crate) fn load_by_extension_probe(&mut self, identifier: &str) -> bool {
        let segments: Vec<&str> = identifier.split(SEPARATOR).collect();
        if segments.len() < 5 {
            return false;
        }
        let Some(kind) = ExtensionKind::from_segment(segments[1]) else {
            return false;
        };

        // Plugins are cross-cutting rather than per-area; they share
        // one root under the empty key.
        let key = match kind {
            ExtensionKind::Plugin => "",
            _ => segments[3],
        };
        let Some(base) = self.extension_root(key).map(|p| p.to_path_buf()) else {
            trace!("No extension root registered for key {:?}", key);
            return false;
        };

        let relative = match kind {
            ExtensionKind::Component => {
                format!("components/com_{}", segments[2].to_lowercase())
            }
            ExtensionKind::Module => {
                format!("modules/mod_{}", ident::camel_to_underscore(segments[2]))
            }
            ExtensionKind::Plugin => format!(
                "plugins/{}/{}",
                segments[2].to_lowercase(),
                segments[3].to_lowercase()
            ),
        };
        let dir = base.join(relative);
        let preferred = dir.join("src");
        let resolved = if preferred.is_dir() {
            preferred
        } else if dir.is_dir() {
            dir
        } else {
            trace!("No extension layout on disk for {}", identifier);
            return false;
        };

        let namespace = segments[..4].join(".");
        debug!(
            "Probed extension layout for {}: {} -> {:?}",
            identifier, namespace, resolved
        );
        self.namespace_table_mut(crate::NamespaceVariant::V4)
            .add(&namespace, &resolved, false, false);
        self.load_by_namespace_v4(identifier)
    }
}
