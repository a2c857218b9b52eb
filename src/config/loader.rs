//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{SinkKind, TriageConfig};
use super::secret::secret_string;
use crate::domain::errors::TriageError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TriageConfig
/// 4. Applies environment variable overrides (TRIAGE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - An override value cannot be parsed
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use triage::config::loader::load_config;
///
/// let config = load_config("triage.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TriageConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TriageError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TriageError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: TriageConfig = toml::from_str(&contents)
        .map_err(|e| TriageError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        TriageError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| TriageError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                if !missing_vars.iter().any(|v| v == var_name) {
                    missing_vars.push(var_name.to_string());
                }
                String::new()
            })
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(TriageError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_override<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            TriageError::Configuration(format!("Invalid value '{val}' for {key}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using TRIAGE_* prefix
///
/// Environment variables follow the pattern: TRIAGE_<SECTION>_<KEY>
/// For example: TRIAGE_IDENTITY_API_ENDPOINT, TRIAGE_PIPELINE_QUEUE_CAPACITY
fn apply_env_overrides(config: &mut TriageConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("TRIAGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Listener overrides
    if let Ok(val) = std::env::var("TRIAGE_LISTENER_BIND_ADDRESS") {
        config.listener.bind_address = val;
    }
    if let Some(bytes) = env_override("TRIAGE_LISTENER_MAX_FRAME_BYTES")? {
        config.listener.max_frame_bytes = bytes;
    }

    // Identity overrides
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_STS_ENDPOINT") {
        config.identity.sts_endpoint = val;
    }
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_API_ENDPOINT") {
        config.identity.api_endpoint = val;
    }
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_USERNAME") {
        config.identity.username = val;
    }
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_PASSWORD") {
        config.identity.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_APP_NAME") {
        config.identity.app_name = val;
    }
    if let Ok(val) = std::env::var("TRIAGE_IDENTITY_APP_KEY") {
        config.identity.app_key = secret_string(val);
    }
    if let Some(timeout) = env_override("TRIAGE_IDENTITY_TIMEOUT_SECONDS")? {
        config.identity.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_override("TRIAGE_IDENTITY_RETRY_MAX_ATTEMPTS")? {
        config.identity.retry.max_attempts = attempts;
    }
    if let Some(backoff) = env_override("TRIAGE_IDENTITY_RETRY_BACKOFF_MS")? {
        config.identity.retry.backoff_ms = backoff;
    }

    // Pipeline overrides
    if let Some(capacity) = env_override("TRIAGE_PIPELINE_QUEUE_CAPACITY")? {
        config.pipeline.queue_capacity = capacity;
    }
    if let Some(concurrency) = env_override("TRIAGE_PIPELINE_MAX_CONCURRENCY")? {
        config.pipeline.max_concurrency = concurrency;
    }
    if let Some(days) = env_override("TRIAGE_PIPELINE_LOOKBACK_DAYS")? {
        config.pipeline.lookback_days = days;
    }
    if let Some(date) = env_override("TRIAGE_PIPELINE_WINDOW_END")? {
        config.pipeline.window_end = Some(date);
    }

    // Sink overrides
    if let Ok(val) = std::env::var("TRIAGE_SINK_KIND") {
        config.sink.kind = match val.to_lowercase().as_str() {
            "log" => SinkKind::Log,
            "http" => SinkKind::Http,
            other => {
                return Err(TriageError::Configuration(format!(
                    "Invalid value '{other}' for TRIAGE_SINK_KIND. Must be one of: log, http"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("TRIAGE_SINK_ENDPOINT") {
        config.sink.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("TRIAGE_SINK_USERNAME") {
        config.sink.username = Some(val);
    }
    if let Ok(val) = std::env::var("TRIAGE_SINK_PASSWORD") {
        config.sink.password = Some(secret_string(val));
    }

    // Logging overrides
    if let Some(enabled) = env_override("TRIAGE_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("TRIAGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("TRIAGE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
