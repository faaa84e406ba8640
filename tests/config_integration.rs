//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use duoframe::config::{AppConfig, ConfigError};
use serial_test::serial;
use std::path::PathBuf;

/// A fresh directory under the system temp dir
fn temp_config_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("duoframe-config-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("DUO_WINDOW__TITLE", "Test From Env");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.window.title, "Test From Env");
    std::env::remove_var("DUO_WINDOW__TITLE");
}

#[test]
#[serial]
fn test_env_override_numeric() {
    std::env::set_var("DUO_CAMERA__FOV", "60.0");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.camera.fov, 60.0);
    std::env::remove_var("DUO_CAMERA__FOV");
}

#[test]
#[serial]
fn test_default_file_matches_builtin_defaults() {
    let config = AppConfig::load().unwrap();
    let builtin = AppConfig::default();

    assert_eq!(config.window.width, builtin.window.width);
    assert_eq!(config.camera.fov, builtin.camera.fov);
    assert_eq!(config.camera.zoom, builtin.camera.zoom);
    assert_eq!(config.frame.time_step, builtin.frame.time_step);
    assert_eq!(config.rendering.clear_color, builtin.rendering.clear_color);
    assert_eq!(config.overlay.panels, builtin.overlay.panels);
}

#[test]
#[serial]
fn test_user_file_overrides_default() {
    let dir = temp_config_dir("user");
    std::fs::write(
        dir.join("default.toml"),
        "[window]\ntitle = \"base\"\nwidth = 320\nheight = 240\nfullscreen = false\nvsync = true\n",
    )
    .unwrap();
    std::fs::write(dir.join("user.toml"), "[window]\ntitle = \"mine\"\n").unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    assert_eq!(config.window.title, "mine");
    assert_eq!(config.window.width, 320);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    let dir = temp_config_dir("missing").join("nowhere");
    let config = AppConfig::load_from(&dir).unwrap();
    assert_eq!(config.window.title, AppConfig::default().window.title);
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    let dir = temp_config_dir("invalid");
    std::fs::write(
        dir.join("default.toml"),
        "[camera]\nfov = 40.0\nnear = 10.0\nfar = 5.0\nzoom = -6.0\n",
    )
    .unwrap();

    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
#[serial]
fn test_malformed_file_is_load_error() {
    let dir = temp_config_dir("malformed");
    std::fs::write(dir.join("default.toml"), "[window\ntitle = ").unwrap();

    let err = AppConfig::load_from(&dir).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}
