//! End-to-end tests for the resolver chain

use classload::{HostRuntime, Loader, LoaderConfig, LoaderError, MemoryRuntime, NamespaceVariant};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn new_loader(base: &Path) -> Loader<MemoryRuntime> {
    let config = LoaderConfig {
        base_dir: base.to_path_buf(),
        ..Default::default()
    };
    let mut loader = Loader::new(config, MemoryRuntime::new());
    loader.setup(true, true, true);
    loader
}

fn write_unit(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "").unwrap();
    path
}

#[test]
fn test_registered_class_resolves_to_exact_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_unit(temp_dir.path(), "widgets/table.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&path, &["Table"]);
    loader.register_class("Table", &path, true);

    assert!(loader.resolve("Table"));
    assert!(loader.runtime().is_defined("Table"));
    assert_eq!(loader.runtime().materialized_count(), 1);

    // A second resolve short-circuits on the already-defined symbol
    assert!(loader.resolve("Table"));
    assert_eq!(loader.runtime().materialized_count(), 1);
}

#[test]
fn test_reregistration_respects_force_flag() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_unit(temp_dir.path(), "a.unit");
    let second = write_unit(temp_dir.path(), "b.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.register_class("Widget", &first, true);

    loader.register_class("Widget", &second, false);
    let mapped: Vec<_> = loader.class_map().collect();
    assert_eq!(mapped, vec![("widget", first.as_path())]);

    loader.register_class("Widget", &second, true);
    let mapped: Vec<_> = loader.class_map().collect();
    assert_eq!(mapped, vec![("widget", second.as_path())]);
}

#[test]
fn test_alias_registration_is_write_once() {
    let temp_dir = TempDir::new().unwrap();
    let mut loader = new_loader(temp_dir.path());

    assert!(loader.register_alias("OldName", "NewName", None));
    assert!(!loader.register_alias("OldName", "OtherName", None));

    // The original mapping survives: resolving the alias goes to NewName
    let path = write_unit(temp_dir.path(), "new.unit");
    loader.runtime_mut().provide_unit(&path, &["NewName"]);
    loader.register_class("NewName", &path, true);

    assert!(loader.resolve("OldName"));
    assert_eq!(loader.runtime().synonym_target("OldName"), Some("NewName"));
}

#[test]
fn test_alias_propagates_after_canonical_load_without_second_read() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_unit(temp_dir.path(), "canonical.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&path, &["Canonical"]);
    loader.register_class("Canonical", &path, true);
    loader.register_alias("Legacy", "Canonical", Some("4.0"));

    assert!(loader.resolve("Canonical"));
    assert!(loader.runtime().is_defined("Legacy"));
    assert_eq!(loader.runtime().materialized_count(), 1);

    let deprecated = loader.deprecated_aliases();
    assert_eq!(deprecated.len(), 1);
    assert_eq!(deprecated[0].alias, "Legacy");
    assert_eq!(deprecated[0].version, "4.0");
}

#[test]
fn test_namespace_registration_validates_root() {
    let temp_dir = TempDir::new().unwrap();
    let mut loader = new_loader(temp_dir.path());

    let missing = temp_dir.path().join("nowhere");
    let err = loader
        .register_namespace("Vendor.Lib", &missing, false, false, NamespaceVariant::V0)
        .unwrap_err();
    assert!(matches!(err, LoaderError::PathNotFound { .. }));
}

#[test]
fn test_v0_namespace_appends_full_path_under_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("legacy");
    let unit = write_unit(&root, "Vendor/Lib/Widget.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["Vendor.Lib.Widget"]);
    loader
        .register_namespace("Vendor.Lib", &root, false, false, NamespaceVariant::V0)
        .unwrap();

    assert!(loader.resolve("Vendor.Lib.Widget"));
    assert!(loader.runtime().is_defined("Vendor.Lib.Widget"));
}

#[test]
fn test_v0_unit_name_underscores_become_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("legacy");
    let unit = write_unit(&root, "Vendor/Lib/My/Widget.unit");

    let mut loader = new_loader(temp_dir.path());
    loader
        .runtime_mut()
        .provide_unit(&unit, &["Vendor.Lib.My_Widget"]);
    loader
        .register_namespace("Vendor.Lib", &root, false, false, NamespaceVariant::V0)
        .unwrap();

    assert!(loader.resolve("Vendor.Lib.My_Widget"));
}

#[test]
fn test_v4_namespace_replaces_matched_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("lib");
    let unit = write_unit(&root, "Widget.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["Vendor.Lib.Widget"]);
    loader
        .register_namespace("Vendor.Lib", &root, false, false, NamespaceVariant::V4)
        .unwrap();

    assert!(loader.resolve("Vendor.Lib.Widget"));
    assert!(loader.runtime().is_defined("Vendor.Lib.Widget"));
}

#[test]
fn test_prefix_requires_uppercase_continuation() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("framework");
    let unit = write_unit(&root, "foo.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["JFoo"]);
    loader.register_prefix("J", &root, false, false).unwrap();

    assert!(loader.resolve("JFoo"));
    assert!(loader.runtime().is_defined("JFoo"));

    // Lowercase continuation is not a prefix boundary
    assert!(!loader.resolve("Jfoo"));
}

#[test]
fn test_prefix_single_segment_doubled_layout() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("framework");
    let unit = write_unit(&root, "table/table.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["JTable"]);
    loader.register_prefix("J", &root, false, false).unwrap();

    assert!(loader.resolve("JTable"));
}

#[test]
fn test_prefix_camel_split_composes_nested_path() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("framework");
    let unit = write_unit(&root, "data/grid/cell.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["JDataGridCell"]);
    loader.register_prefix("J", &root, false, false).unwrap();

    assert!(loader.resolve("JDataGridCell"));
}

#[test]
fn test_prepended_root_is_searched_first() {
    let temp_dir = TempDir::new().unwrap();
    let old_root = temp_dir.path().join("old");
    let new_root = temp_dir.path().join("new");
    let old_unit = write_unit(&old_root, "foo.unit");
    let new_unit = write_unit(&new_root, "foo.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&old_unit, &["FromOld"]);
    loader.runtime_mut().provide_unit(&new_unit, &["JFoo", "FromNew"]);
    loader.register_prefix("J", &old_root, false, false).unwrap();
    loader.register_prefix("J", &new_root, false, true).unwrap();

    assert!(loader.resolve("JFoo"));
    assert!(loader.runtime().is_defined("FromNew"));
    assert!(!loader.runtime().is_defined("FromOld"));
}

#[test]
fn test_failed_load_settles_prefix_across_roots() {
    // The first existing file decides the outcome for its prefix: when
    // it fails to execute, a copy under a later root is not tried.
    let temp_dir = TempDir::new().unwrap();
    let first_root = temp_dir.path().join("first");
    let second_root = temp_dir.path().join("second");
    let broken = write_unit(&first_root, "foo.unit");
    let spare = write_unit(&second_root, "foo.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&broken, &["JFoo"]);
    loader.runtime_mut().fail_unit(&broken);
    loader.runtime_mut().provide_unit(&spare, &["JFoo", "FromSpare"]);
    loader.register_prefix("J", &first_root, false, false).unwrap();
    loader.register_prefix("J", &second_root, false, false).unwrap();

    assert!(!loader.resolve("JFoo"));
    assert!(!loader.runtime().is_defined("JFoo"));
    assert!(!loader.runtime().is_defined("FromSpare"));
    assert_eq!(loader.runtime().materialized_count(), 0);
}

#[test]
fn test_import_is_memoized() {
    let temp_dir = TempDir::new().unwrap();
    let unit = write_unit(temp_dir.path(), "vendor/fs/file.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["VendorFsFile"]);

    assert!(loader.import_library("vendor.fs.file", None));
    assert_eq!(loader.runtime().materialized_count(), 1);

    // Second call is a memo hit, no further filesystem or load work
    assert!(loader.import_library("vendor.fs.file", None));
    assert_eq!(loader.runtime().materialized_count(), 1);
}

#[test]
fn test_import_failure_is_cached_not_retried() {
    let temp_dir = TempDir::new().unwrap();
    let mut loader = new_loader(temp_dir.path());

    assert!(!loader.import_library("vendor.missing", None));

    // Creating the file afterwards does not change the memoized answer
    let unit = write_unit(temp_dir.path(), "vendor/missing.unit");
    loader.runtime_mut().provide_unit(&unit, &["VendorMissing"]);
    assert!(!loader.import_library("vendor.missing", None));
}

#[test]
fn test_import_doubled_layout_fallback() {
    let temp_dir = TempDir::new().unwrap();
    let unit = write_unit(temp_dir.path(), "vendor/grid/grid.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["VendorGrid"]);

    assert!(loader.import_library("vendor.grid", None));
    assert!(loader.runtime().is_defined("VendorGrid"));
}

#[test]
fn test_extension_probe_registers_v4_namespace_and_loads() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("components/com_content/src");
    let unit = write_unit(temp_dir.path(), "components/com_content/src/Article.unit");

    let mut loader = new_loader(temp_dir.path());
    loader
        .runtime_mut()
        .provide_unit(&unit, &["Acme.Component.Content.Site.Article"]);
    loader.register_extension_root("Site", temp_dir.path());

    assert!(loader.resolve("Acme.Component.Content.Site.Article"));
    assert!(loader
        .runtime()
        .is_defined("Acme.Component.Content.Site.Article"));

    // The probe left a v4 namespace behind, rooted at the src dir
    let namespaces = loader.namespaces(NamespaceVariant::V4);
    assert_eq!(
        namespaces.get("Acme.Component.Content.Site").unwrap(),
        &vec![src]
    );
}

#[test]
fn test_discovery_is_shallow_unless_recursive() {
    let temp_dir = TempDir::new().unwrap();
    let foo = write_unit(temp_dir.path(), "Foo.unit");
    write_unit(temp_dir.path(), "sub/Bar.unit");
    // Files with other extensions are ignored
    fs::write(temp_dir.path().join("README.md"), "").unwrap();

    let mut loader = new_loader(temp_dir.path());
    loader.discover_classes("lib.", temp_dir.path(), true, false);

    assert!(loader.is_registered_class("lib.foo"));
    assert!(!loader.is_registered_class("lib.bar"));
    let mapped: Vec<_> = loader.class_map().collect();
    assert_eq!(mapped, vec![("lib.foo", foo.as_path())]);

    loader.discover_classes("lib.", temp_dir.path(), true, true);
    assert!(loader.is_registered_class("lib.bar"));
}

#[test]
fn test_discovery_swallows_bad_roots() {
    let temp_dir = TempDir::new().unwrap();
    let plain_file = write_unit(temp_dir.path(), "plain.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.discover_classes("lib.", &temp_dir.path().join("missing"), true, false);
    loader.discover_classes("lib.", &plain_file, true, false);

    assert_eq!(loader.class_map().count(), 0);
}

#[test]
fn test_classmap_wins_over_conventions() {
    let temp_dir = TempDir::new().unwrap();
    let mapped = write_unit(temp_dir.path(), "mapped.unit");
    let conventional = write_unit(temp_dir.path(), "framework/foo.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&mapped, &["JFoo", "FromMap"]);
    loader
        .runtime_mut()
        .provide_unit(&conventional, &["FromConvention"]);
    loader
        .register_prefix("J", &temp_dir.path().join("framework"), false, false)
        .unwrap();
    loader.register_class("JFoo", &mapped, true);

    assert!(loader.resolve("JFoo"));
    assert!(loader.runtime().is_defined("FromMap"));
    assert!(!loader.runtime().is_defined("FromConvention"));
}

#[test]
fn test_alias_of_mapped_file_binds_without_second_load() {
    // The mapped file defines the canonical name; resolving the alias
    // identifier must end with a synonym binding, not a second read.
    let temp_dir = TempDir::new().unwrap();
    let unit = write_unit(temp_dir.path(), "widget.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&unit, &["Widget"]);
    loader.register_alias("LegacyWidget", "Widget", None);
    loader.register_class("LegacyWidget", &unit, true);

    assert!(loader.resolve("LegacyWidget"));
    assert!(loader.runtime().is_defined("LegacyWidget"));
    assert_eq!(
        loader.runtime().synonym_target("LegacyWidget"),
        Some("Widget")
    );
}

#[test]
fn test_namespace_reset_replaces_roots() {
    let temp_dir = TempDir::new().unwrap();
    let old_root = temp_dir.path().join("old");
    let new_root = temp_dir.path().join("new");
    let old_unit = write_unit(&old_root, "Widget.unit");
    write_unit(&new_root, "placeholder.unit");

    let mut loader = new_loader(temp_dir.path());
    loader.runtime_mut().provide_unit(&old_unit, &["Vendor.Lib.Widget"]);
    loader
        .register_namespace("Vendor.Lib", &old_root, false, false, NamespaceVariant::V4)
        .unwrap();
    loader
        .register_namespace("Vendor.Lib", &new_root, true, false, NamespaceVariant::V4)
        .unwrap();

    // The old root is gone; only the new (empty) root is searched
    assert!(!loader.resolve("Vendor.Lib.Widget"));
    assert_eq!(
        loader.namespaces(NamespaceVariant::V4).get("Vendor.Lib").unwrap(),
        &vec![new_root]
    );
}
