//! Tests for configuration defaults and TOML parsing.

use crate::config::{Config, TransparencyLogConfig};
use crate::types::{DEFAULT_INDEX_SNAPSHOT_PATH, EMBEDDING_DIM};

#[test]
fn test_default_config() {
    let config = Config::default_config();
    assert_eq!(config.index.dimension, EMBEDDING_DIM);
    assert_eq!(config.index.snapshot_path, DEFAULT_INDEX_SNAPSHOT_PATH);
    assert_eq!(config.pipeline.similarity_top_k, 5);
    assert_eq!(config.logging.level, "info");
    assert!(!config.transparency_log.is_configured());
}

#[test]
fn test_partial_toml_fills_defaults() {
    let toml_str = r#"
        [pipeline]
        max_concurrent_assets = 2

        [transparency_log]
        server_addr = "http://log:8090"
        log_id = "42"
    "#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.pipeline.max_concurrent_assets, 2);
    assert_eq!(config.pipeline.queue_capacity, 256);
    assert_eq!(config.server.port, 8080);
    assert!(config.transparency_log.is_configured());
}

#[test]
fn test_from_file_reads_without_validating() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proofpix.toml");
    std::fs::write(&path, "[index]\nsnapshot_path = \"snap/x.flat\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.index.snapshot_path, "snap/x.flat");
    assert!(config.validate().is_ok());

    std::fs::write(&path, "[index]\ndimension = 0\n").unwrap();
    let config = Config::from_file(&path).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_override_after_load_rescues_invalid_port() {
    println!("=== TEST: override applied before validation ===");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proofpix.toml");
    std::fs::write(&path, "[server]\nport = 0\n").unwrap();

    let mut config = Config::from_file(&path).unwrap();
    println!("BEFORE: port={}", config.server.port);
    assert!(config.validate().is_err());

    config.server.port = 9000;
    println!("AFTER: port={}", config.server.port);
    assert!(config.validate().is_ok());
    println!("RESULT: PASS");
}

#[test]
fn test_from_file_missing_path() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/proofpix.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_transparency_env_overrides() {
    let mut log = TransparencyLogConfig::default();
    log.apply_env_overrides(|key| match key {
        "TRILLIAN_LOG_ID" => Some("7".to_string()),
        "TRILLIAN_LOG_SERVER_ADDR" => Some("http://trillian:8090".to_string()),
        _ => None,
    });
    assert_eq!(log.log_id.as_deref(), Some("7"));
    assert_eq!(log.server_addr.as_deref(), Some("http://trillian:8090"));
    assert!(log.is_configured());
}

#[test]
fn test_blank_log_fields_are_not_configured() {
    let log = TransparencyLogConfig {
        server_addr: Some("  ".into()),
        log_id: Some("1".into()),
    };
    assert!(!log.is_configured());
}
