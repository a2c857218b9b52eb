//! Integration tests for configuration loading and validation
//!
//! Tests that touch environment variables hold `ENV_MUTEX`.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use triage::config::{load_config, SinkKind};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("TRIAGE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("TRIAGE_IDENTITY_API_ENDPOINT");
    std::env::remove_var("TRIAGE_IDENTITY_RETRY_MAX_ATTEMPTS");
    std::env::remove_var("TRIAGE_PIPELINE_WINDOW_END");
    std::env::remove_var("TRIAGE_SINK_KIND");
    std::env::remove_var("TEST_IDENTITY_PASSWORD");
    std::env::remove_var("TEST_IDENTITY_APP_KEY");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

const MINIMAL: &str = r#"
[identity]
sts_endpoint = "https://identity.example.com/sts/token"
api_endpoint = "https://identity.example.com/oc/"
username = "triage"
password = "pass"
app_name = "triage"
app_key = "key"

[tenants]
"1" = 1001
MDA = 1002
PSJ = 1003
"#;

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"

[listener]
bind_address = "127.0.0.1:6661"
max_frame_bytes = 65536

[identity]
sts_endpoint = "https://identity.example.com/sts/token"
api_endpoint = "https://identity.example.com/oc/"
username = "test_user"
password = "test_pass"
app_name = "triage-test"
app_key = "test_key"
timeout_seconds = 10
encounter_search_path = "api/FHIR/STU3/Encounter?_count=50"

[identity.retry]
max_attempts = 3
backoff_ms = 500

[tenants]
"1" = 1001
MDA = 1002

[pipeline]
queue_capacity = 50
max_concurrency = 4
lookback_days = 14
window_end = "2021-07-08"

[sink]
kind = "http"
endpoint = "https://records.example.com/fhir"
username = "sink"
password = "sink_pass"

[logging]
local_enabled = false
local_path = "/tmp/triage"
local_rotation = "hourly"
"#,
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.listener.bind_address, "127.0.0.1:6661");
    assert_eq!(config.listener.max_frame_bytes, 65536);

    assert_eq!(config.identity.username, "test_user");
    assert_eq!(config.identity.password.expose_secret().as_str(), "test_pass");
    assert_eq!(config.identity.app_key.expose_secret().as_str(), "test_key");
    assert_eq!(config.identity.timeout_seconds, 10);
    assert_eq!(config.identity.retry.max_attempts, 3);
    assert_eq!(config.identity.retry.backoff_ms, 500);

    assert_eq!(config.tenants.get("MDA"), Some(&1002));
    assert_eq!(config.tenants.len(), 2);

    assert_eq!(config.pipeline.queue_capacity, 50);
    assert_eq!(config.pipeline.lookback_days, 14);
    assert_eq!(
        config.pipeline.window_end,
        chrono::NaiveDate::from_ymd_opt(2021, 7, 8)
    );

    assert_eq!(config.sink.kind, SinkKind::Http);
    assert_eq!(
        config.sink.endpoint.as_deref(),
        Some("https://records.example.com/fhir")
    );

    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(MINIMAL);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.listener.bind_address, "0.0.0.0:2575");
    assert_eq!(config.identity.timeout_seconds, 30);
    assert_eq!(config.identity.encounter_search_path, "api/FHIR/STU3/Encounter");
    assert_eq!(config.identity.retry.max_attempts, 5);
    assert_eq!(config.identity.retry.backoff_ms, 2000);
    assert_eq!(config.pipeline.lookback_days, 7);
    assert_eq!(config.pipeline.window_end, None);
    assert_eq!(config.sink.kind, SinkKind::Log);
    assert_eq!(config.logging.local_rotation, "daily");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_IDENTITY_PASSWORD", "secret_pass");
    std::env::set_var("TEST_IDENTITY_APP_KEY", "secret_key");

    let temp_file = write_config(
        &MINIMAL
            .replace("password = \"pass\"", "password = \"${TEST_IDENTITY_PASSWORD}\"")
            .replace("app_key = \"key\"", "app_key = \"${TEST_IDENTITY_APP_KEY}\""),
    );

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.identity.password.expose_secret().as_str(), "secret_pass");
    assert_eq!(config.identity.app_key.expose_secret().as_str(), "secret_key");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_vars_are_reported_together() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        &MINIMAL
            .replace("password = \"pass\"", "password = \"${TEST_IDENTITY_PASSWORD}\"")
            .replace("app_key = \"key\"", "app_key = \"${TEST_IDENTITY_APP_KEY}\""),
    );

    let err = load_config(temp_file.path()).unwrap_err().to_string();
    assert!(err.contains("TEST_IDENTITY_PASSWORD"));
    assert!(err.contains("TEST_IDENTITY_APP_KEY"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TRIAGE_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("TRIAGE_IDENTITY_API_ENDPOINT", "https://override.example.com/oc/");
    std::env::set_var("TRIAGE_IDENTITY_RETRY_MAX_ATTEMPTS", "2");
    std::env::set_var("TRIAGE_PIPELINE_WINDOW_END", "2021-07-08");

    let temp_file = write_config(MINIMAL);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.identity.api_endpoint, "https://override.example.com/oc/");
    assert_eq!(config.identity.retry.max_attempts, 2);
    assert_eq!(
        config.pipeline.window_end,
        chrono::NaiveDate::from_ymd_opt(2021, 7, 8)
    );

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TRIAGE_SINK_KIND", "kafka");

    let temp_file = write_config(MINIMAL);
    let result = load_config(temp_file.path());

    cleanup_env_vars();
    assert!(result.is_err());
}

#[test]
fn test_empty_tenant_table_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let without_tenants = MINIMAL.split("[tenants]").next().unwrap().to_string();
    let temp_file = write_config(&without_tenants);

    let err = load_config(temp_file.path()).unwrap_err().to_string();
    assert!(err.contains("tenants"));
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(&format!(
        "[application]\nlog_level = \"invalid_level\"\n{MINIMAL}"
    ));
    assert!(load_config(temp_file.path()).is_err());
}
