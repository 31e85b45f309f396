//! Resolver indexing, caching and failure behavior.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serview::{ResolutionError, ResolverConfig, TypeResolver};
use tempfile::TempDir;

fn archive(types: &str) -> String {
    format!(r#"{{ "types": [ {types} ] }}"#)
}

fn write_archive(dir: &TempDir, file: &str, body: &str) {
    fs::write(dir.path().join(file), body).expect("write archive");
}

fn resolver_over(dir: &TempDir) -> TypeResolver {
    // Surface the per-archive diagnostics when tests run with RUST_LOG set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    TypeResolver::new(ResolverConfig {
        search_paths: vec![dir.path().to_path_buf()],
    })
}

const WIDGET: &str = r#"{
  "name": "com.acme.Widget",
  "fields": [
    { "name": "id", "type": "long", "primitive": true },
    { "name": "label", "type": "java.lang.String" }
  ]
}"#;

#[test]
fn resolve_scans_once_and_caches() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(&dir, "acme.types.json", &archive(WIDGET));
    let resolver = resolver_over(&dir);

    assert_eq!(resolver.scan_count(), 0);
    let first = resolver.resolve("com.acme.Widget").expect("first resolve");
    let second = resolver.resolve("com.acme.Widget").expect("second resolve");

    assert_eq!(resolver.scan_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));

    let order: Vec<&str> = first.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(order, ["id", "label"]);
}

#[test]
fn unknown_type_is_not_found() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(&dir, "acme.types.json", &archive(WIDGET));
    let resolver = resolver_over(&dir);

    assert_eq!(
        resolver.resolve("com.acme.Gadget"),
        Err(ResolutionError::NotFound("com.acme.Gadget".to_string()))
    );
}

#[test]
fn missing_search_path_resolves_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let resolver = TypeResolver::new(ResolverConfig {
        search_paths: vec![dir.path().join("does-not-exist")],
    });

    assert_eq!(
        resolver.resolve("com.acme.Widget"),
        Err(ResolutionError::NotFound("com.acme.Widget".to_string()))
    );
    // The empty scan still counts as the one scan.
    assert_eq!(resolver.scan_count(), 1);
}

#[test]
fn corrupt_archive_is_skipped_not_fatal() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(&dir, "broken.types.json", "{ not json");
    write_archive(&dir, "good.types.json", &archive(WIDGET));
    let resolver = resolver_over(&dir);

    // The broken archive is logged and skipped; the good one still serves.
    let widget = resolver.resolve("com.acme.Widget").expect("resolve");
    assert_eq!(widget.name, "com.acme.Widget");
}

#[test]
fn archive_vanishing_after_indexing_is_load_failed() {
    let dir = TempDir::new().expect("temp dir");
    let two_types = format!(
        "{WIDGET}, {}",
        r#"{ "name": "com.acme.Sprocket", "fields": [] }"#
    );
    write_archive(&dir, "acme.types.json", &archive(&two_types));
    let resolver = resolver_over(&dir);

    // Build the index and cache one of the two types.
    resolver.resolve("com.acme.Widget").expect("resolve widget");

    // Corrupt the archive after indexing; the uncached type now fails at
    // load time while the cached one keeps resolving.
    write_archive(&dir, "acme.types.json", "{ not json");
    match resolver.resolve("com.acme.Sprocket") {
        Err(ResolutionError::LoadFailed { archive, .. }) => {
            assert!(archive.ends_with("acme.types.json"));
        }
        other => panic!("expected LoadFailed, got {other:?}"),
    }
    resolver.resolve("com.acme.Widget").expect("still cached");
}

#[test]
fn first_archive_in_name_order_wins_duplicates() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(
        &dir,
        "a.types.json",
        &archive(r#"{ "name": "com.acme.Dup", "fields": [ { "name": "from_a", "type": "int", "primitive": true } ] }"#),
    );
    write_archive(
        &dir,
        "b.types.json",
        &archive(r#"{ "name": "com.acme.Dup", "fields": [ { "name": "from_b", "type": "int", "primitive": true } ] }"#),
    );
    let resolver = resolver_over(&dir);

    let dup = resolver.resolve("com.acme.Dup").expect("resolve");
    assert_eq!(dup.fields[0].name, "from_a");
}

#[test]
fn manifest_without_types_key_contributes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(&dir, "empty.types.json", "{}");
    write_archive(&dir, "acme.types.json", &archive(WIDGET));
    let resolver = resolver_over(&dir);

    resolver.resolve("com.acme.Widget").expect("resolve");
}

#[test]
fn non_archive_files_are_ignored() {
    let dir = TempDir::new().expect("temp dir");
    write_archive(&dir, "readme.txt", "not an archive");
    write_archive(&dir, "acme.types.json", &archive(WIDGET));
    let resolver = resolver_over(&dir);

    resolver.resolve("com.acme.Widget").expect("resolve");
    assert_eq!(
        resolver.resolve("readme"),
        Err(ResolutionError::NotFound("readme".to_string()))
    );
}

#[test]
fn shared_resolver_is_initialized_once() {
    let first = TypeResolver::shared(ResolverConfig::default());
    let second = TypeResolver::shared(ResolverConfig {
        search_paths: vec![std::path::PathBuf::from("/somewhere/else")],
    });
    assert!(Arc::ptr_eq(&first, &second));
}
