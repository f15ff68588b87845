//! Integration tests for configuration resolution
//!
//! Covers:
//! - Missing TOML file falls back to compiled defaults
//! - TOML values override defaults
//! - Environment overrides TOML, CLI overrides environment
//! - Invalid files and invalid values are reported as errors
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that touch PROXY_URL or THUMBFETCH_* are marked with #[serial].

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;
use thumbfetch_common::config::{
    load_toml_config, ConfigOverrides, EnvConfig, FetchConfig, TomlConfig, CONFIG_ENV_VAR,
    DATA_DIR_ENV_VAR, ERROR_DIR_ENV_VAR, PROXY_ENV_VAR,
};
use thumbfetch_common::Error;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(PROXY_ENV_VAR);
    env::remove_var(DATA_DIR_ENV_VAR);
    env::remove_var(ERROR_DIR_ENV_VAR);
}

#[test]
fn test_toml_values_override_defaults() {
    let toml_config: TomlConfig = toml::from_str(
        r#"
        data_dir = "/srv/thumbs/data"
        batch_workers = 4
        jitter_min_ms = 0
        jitter_max_ms = 0
        doc_id = "123"
        "#,
    )
    .unwrap();

    let config =
        FetchConfig::from_layers(toml_config, EnvConfig::default(), &ConfigOverrides::default())
            .unwrap();

    assert_eq!(config.data_dir, PathBuf::from("/srv/thumbs/data"));
    assert_eq!(config.batch_workers, 4);
    assert_eq!(config.jitter_max_ms, 0);
    assert_eq!(config.doc_id, "123");
    // Untouched fields keep their defaults
    assert_eq!(config.error_dir, PathBuf::from("error"));
    assert_eq!(config.retry_workers, 10);
    assert_eq!(config.app_id, "936619743392459");
}

#[test]
fn test_priority_cli_over_env_over_toml() {
    let toml_config = TomlConfig {
        proxy_url: Some("http://toml-proxy:8080".to_string()),
        data_dir: Some(PathBuf::from("toml-data")),
        error_dir: Some(PathBuf::from("toml-error")),
        ..Default::default()
    };
    let env_config = EnvConfig {
        proxy_url: Some("http://env-proxy:8080".to_string()),
        data_dir: Some(PathBuf::from("env-data")),
        error_dir: None,
    };
    let cli = ConfigOverrides {
        data_dir: Some(PathBuf::from("cli-data")),
        ..Default::default()
    };

    let config = FetchConfig::from_layers(toml_config, env_config, &cli).unwrap();

    assert_eq!(config.data_dir, PathBuf::from("cli-data"));
    assert_eq!(config.proxy_url.as_deref(), Some("http://env-proxy:8080"));
    assert_eq!(config.error_dir, PathBuf::from("toml-error"));
}

#[test]
fn test_unknown_toml_key_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("thumbfetch.toml");
    std::fs::write(&path, "worker_count = 3\n").unwrap();

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
fn test_missing_explicit_config_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_toml_config(&temp_dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_progress_log_follows_resolved_data_dir() {
    let env_config = EnvConfig {
        data_dir: Some(PathBuf::from("/srv/run-a/data")),
        ..Default::default()
    };
    let config =
        FetchConfig::from_layers(TomlConfig::default(), env_config, &ConfigOverrides::default())
            .unwrap();
    assert_eq!(
        config.progress_log,
        PathBuf::from("/srv/run-a/data.progress.log")
    );

    // A fresh data dir from the command line gets a fresh checkpoint
    let cli = ConfigOverrides {
        data_dir: Some(PathBuf::from("/srv/run-b/data")),
        ..Default::default()
    };
    let other =
        FetchConfig::from_layers(TomlConfig::default(), EnvConfig::default(), &cli).unwrap();
    assert_ne!(other.progress_log, config.progress_log);
}

#[test]
fn test_explicit_progress_log_kept() {
    let toml_config = TomlConfig {
        progress_log: Some(PathBuf::from("/var/lib/thumbfetch/progress.log")),
        ..Default::default()
    };
    let cli = ConfigOverrides {
        data_dir: Some(PathBuf::from("elsewhere")),
        ..Default::default()
    };

    let config = FetchConfig::from_layers(toml_config, EnvConfig::default(), &cli).unwrap();
    assert_eq!(
        config.progress_log,
        PathBuf::from("/var/lib/thumbfetch/progress.log")
    );
}

#[test]
#[serial]
fn test_resolve_without_config_file_uses_defaults() {
    clear_env();

    // No --config, no THUMBFETCH_CONFIG; the test working dir has no thumbfetch.toml
    let config = FetchConfig::resolve(&ConfigOverrides::default()).unwrap();

    assert_eq!(config, FetchConfig::default());
}

#[test]
#[serial]
fn test_resolve_reads_config_from_env_var() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    std::fs::write(&path, "retry_workers = 3\nrequest_timeout_secs = 10\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = FetchConfig::resolve(&ConfigOverrides::default()).unwrap();

    assert_eq!(config.retry_workers, 3);
    assert_eq!(config.request_timeout_secs, 10);

    clear_env();
}

#[test]
#[serial]
fn test_proxy_url_env_var_applied() {
    clear_env();
    env::set_var(PROXY_ENV_VAR, "http://127.0.0.1:3128");

    let config = FetchConfig::resolve(&ConfigOverrides::default()).unwrap();
    assert_eq!(config.proxy_url.as_deref(), Some("http://127.0.0.1:3128"));

    clear_env();
}

#[test]
#[serial]
fn test_empty_proxy_env_var_ignored() {
    clear_env();
    env::set_var(PROXY_ENV_VAR, "  ");

    assert_eq!(EnvConfig::from_env().proxy_url, None);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_in_file_fail_resolution() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "jitter_min_ms = 900\njitter_max_ms = 100\n").unwrap();

    let overrides = ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    };

    let result = FetchConfig::resolve(&overrides);
    assert!(matches!(result, Err(Error::Config(_))));
}
