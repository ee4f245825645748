use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::settings::expand_path;
use crate::config::{ConfigError, Settings};

#[test]
fn test_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.ipc_timeout(), Duration::from_millis(500));
    assert_eq!(settings.trapping_cache_ttl(), Duration::from_secs(1));
    assert!(settings.verify_hotkey);
    assert_eq!(settings.editor_identity, "org.keytrap.editor");
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::load(&temp_dir.path().join("settings.json")).unwrap();

    assert_eq!(settings.ipc_timeout_ms, 500);
    assert!(!settings.library_path.starts_with("~"), "Paths should be expanded");
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{ "ipc_timeout_ms": 250, "library_path": "/tmp/keytrap/lib.json" }"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();

    assert_eq!(settings.ipc_timeout(), Duration::from_millis(250));
    assert_eq!(settings.library_path, PathBuf::from("/tmp/keytrap/lib.json"));
    assert_eq!(settings.diagnostics_capacity, 64);
}

#[test]
fn test_invalid_file_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, r#"{ "ipc_timeout_ms": "soon" }"#).unwrap();

    assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_tilde_expansion() {
    let expanded = expand_path(&PathBuf::from("~/keytrap.json"));
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("keytrap.json"));

    let absolute = expand_path(&PathBuf::from("/etc/keytrap.json"));
    assert_eq!(absolute, PathBuf::from("/etc/keytrap.json"));
}
