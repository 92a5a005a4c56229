//! File and environment precedence for resolver configuration.

use seishdr_config::{ConfigError, ConfigProvider, OversizePolicy};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn clear_env() {
    for key in [
        "SEISHDR_DISPLAY_WIDTH",
        "SEISHDR_OVERSIZE",
        "SEISHDR_OVERSIZE_MARKER",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_toml_file_overrides_defaults() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seishdr.toml");
    fs::write(
        &path,
        r#"
display_width = 12
oversize = "marker"

[[leap_seconds]]
date = "2015-07-01"
tai_minus_utc = 36

[[leap_seconds]]
date = "2017-01-01"
tai_minus_utc = 37
"#,
    )
    .unwrap();

    let config = ConfigProvider::new().with_file(&path).load().unwrap();
    assert_eq!(config.display_width, Some(12));
    assert_eq!(config.oversize, OversizePolicy::Marker);
    assert_eq!(config.oversize_marker, "<oversized>");
    assert_eq!(config.leap_seconds.len(), 2);
}

#[test]
#[serial]
fn test_yaml_file_is_accepted() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seishdr.yaml");
    fs::write(&path, "display_width: 8\noversize_marker: \"***\"\n").unwrap();

    let config = ConfigProvider::new().with_file(&path).load().unwrap();
    assert_eq!(config.display_width, Some(8));
    assert_eq!(config.oversize_marker, "***");
    assert_eq!(config.oversize, OversizePolicy::Truncate);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seishdr.json");
    fs::write(&path, r#"{ "display_width": 8 }"#).unwrap();

    std::env::set_var("SEISHDR_DISPLAY_WIDTH", "20");
    let config = ConfigProvider::new().with_file(&path).load();
    clear_env();

    assert_eq!(config.unwrap().display_width, Some(20));
}

#[test]
#[serial]
fn test_invalid_leap_table_fails_validation() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seishdr.toml");
    fs::write(
        &path,
        r#"
[[leap_seconds]]
date = "2017-01-01"
tai_minus_utc = 37

[[leap_seconds]]
date = "2017-01-01"
tai_minus_utc = 38
"#,
    )
    .unwrap();

    let err = ConfigProvider::new().with_file(&path).load().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}

#[test]
#[serial]
fn test_malformed_value_is_a_parse_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("seishdr.toml");
    fs::write(&path, "oversize = \"sideways\"\n").unwrap();

    let err = ConfigProvider::new().with_file(&path).load().unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}
