//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_haven_config.toml"));
    assert!(matches!(
        result,
        Err(haven_common::ConfigError::FileNotFound(_))
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "http://127.0.0.1:9000"
stall_timeout_secs = 5

[directory]
title_max_chars = 30
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    assert_eq!(config.api.stall_timeout_secs, 5);
    assert_eq!(config.directory.title_max_chars, 30);
    // Defaults preserved
    assert_eq!(config.api.chat_path, "/chat");
    assert_eq!(config.directory.preview_max_chars, 100);
    assert_eq!(config.exchange.complex_prompt_chars, 280);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(
        result,
        Err(haven_common::ConfigError::ParseError(_))
    ));
}

#[test]
fn load_config_with_invalid_values_keeps_parsed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
stall_timeout_secs = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.api.stall_timeout_secs, 0);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.auth.token_env, "HAVEN_TOKEN");
    assert_eq!(config.api.stall_timeout_secs, 45);
}

#[test]
fn load_or_create_writes_default_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven").join("config.toml");

    let config = load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.api.stall_timeout_secs, 45);
}

#[test]
fn load_or_create_keeps_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[api]
base_url = "http://127.0.0.1:9000"
stall_timeout_secs = 0
"#,
    )
    .unwrap();

    let config = load_or_create(&path).unwrap();
    assert_eq!(config.api.stall_timeout_secs, 0);
    assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
}

#[test]
fn default_path_ends_with_haven_config() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("haven/config.toml"));
    }
}
