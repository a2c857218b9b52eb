//! Integration tests for logging functionality
//!
//! The global subscriber can be installed once per process, so every
//! initialization check lives in a single test.

use tempfile::TempDir;
use triage::config::LoggingConfig;
use triage::logging::init_logging;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "/var/log/triage");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let config = LoggingConfig {
        local_enabled: false,
        local_path: String::new(),
        local_rotation: "daily".to_string(),
    };
    assert!(init_logging("verbose", &config).is_err());
}

#[test]
fn test_init_creates_directory_and_installs_once() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).expect("first init succeeds");
    assert!(log_path.is_dir());

    triage::log_retry_attempt!(1, 5, "connection refused");
    triage::log_stage_halt!("tenant", uuid::Uuid::new_v4(), "no tenant for facility code 'XYZ'");

    let second = init_logging("info", &config);
    assert!(second.is_err());

    drop(guard);
}
