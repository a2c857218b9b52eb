//! Configuration schema types
//!
//! This module defines the configuration structure for Triage.

use crate::config::SecretString;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main Triage configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Inbound MLLP listener
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Identity/record service connection
    pub identity: IdentityConfig,

    /// Facility code → tenant id
    #[serde(default)]
    pub tenants: BTreeMap<String, i64>,

    /// Queue and stage worker settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Where aggregated records are delivered
    #[serde(default)]
    pub sink: SinkConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TriageConfig {
    /// Loads, overrides and validates a configuration file
    ///
    /// See [`crate::config::load_config`].
    pub fn from_file(path: impl AsRef<Path>) -> crate::domain::Result<Self> {
        crate::config::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.listener.validate()?;
        self.identity.validate()?;
        validate_tenants(&self.tenants)?;
        self.pipeline.validate()?;
        self.sink.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            listener: ListenerConfig::default(),
            identity: IdentityConfig::default(),
            tenants: default_tenants(),
            pipeline: PipelineConfig::default(),
            sink: SinkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn validate_tenants(tenants: &BTreeMap<String, i64>) -> Result<(), String> {
    if tenants.is_empty() {
        return Err(
            "tenants table cannot be empty; every message would halt without a tenant".to_string(),
        );
    }
    if let Some(code) = tenants.keys().find(|code| code.trim().is_empty()) {
        return Err(format!("tenants contains a blank facility code: '{code}'"));
    }
    Ok(())
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// MLLP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:2575`
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Largest accepted frame; larger frames close the connection
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl ListenerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "listener.bind_address '{}' is not a socket address",
                self.bind_address
            ));
        }
        if self.max_frame_bytes < 64 {
            return Err("listener.max_frame_bytes must be at least 64".to_string());
        }
        Ok(())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

/// Credential fetch retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Identity/record service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Token endpoint (POST)
    pub sts_endpoint: String,

    /// Base URL for authenticated GETs
    pub api_endpoint: String,

    pub username: String,

    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,

    pub app_name: String,

    /// Stored securely in memory and automatically zeroized on drop
    pub app_key: SecretString,

    /// Per-request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Encounter search path, relative to `api_endpoint`
    #[serde(default = "default_encounter_search_path")]
    pub encounter_search_path: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl IdentityConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        for (name, url) in [
            ("identity.sts_endpoint", &self.sts_endpoint),
            ("identity.api_endpoint", &self.api_endpoint),
        ] {
            if url.is_empty() {
                return Err(format!("{name} cannot be empty"));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{name} must start with http:// or https://"));
            }
        }

        if self.username.is_empty() {
            return Err("identity.username cannot be empty".to_string());
        }
        if self.password.expose_secret().is_empty() {
            return Err("identity.password cannot be empty".to_string());
        }
        if self.app_name.is_empty() {
            return Err("identity.app_name cannot be empty".to_string());
        }
        if self.app_key.expose_secret().is_empty() {
            return Err("identity.app_key cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err("identity.timeout_seconds must be between 1 and 300".to_string());
        }
        if self.encounter_search_path.trim().is_empty() {
            return Err("identity.encounter_search_path cannot be empty".to_string());
        }
        if self.retry.max_attempts == 0 || self.retry.max_attempts > 20 {
            return Err("identity.retry.max_attempts must be between 1 and 20".to_string());
        }
        if self.retry.backoff_ms > 60_000 {
            return Err("identity.retry.backoff_ms cannot exceed 60000".to_string());
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        use crate::config::secret_string;

        Self {
            sts_endpoint: "http://localhost:8080/sts/token".to_string(),
            api_endpoint: "http://localhost:8080/oc".to_string(),
            username: "triage".to_string(),
            password: secret_string("changeme".to_string()),
            app_name: "triage".to_string(),
            app_key: secret_string("changeme".to_string()),
            timeout_seconds: default_timeout_seconds(),
            encounter_search_path: default_encounter_search_path(),
            retry: RetryConfig::default(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bound of each inter-stage queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Items processed concurrently per stage
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Size of the record search window in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Fixed end of the search window; the current UTC date when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<NaiveDate>,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("pipeline.queue_capacity must be > 0".to_string());
        }
        if self.max_concurrency == 0 || self.max_concurrency > 1024 {
            return Err("pipeline.max_concurrency must be between 1 and 1024".to_string());
        }
        if self.lookback_days == 0 || self.lookback_days > 3650 {
            return Err("pipeline.lookback_days must be between 1 and 3650".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_concurrency: default_max_concurrency(),
            lookback_days: default_lookback_days(),
            window_end: None,
        }
    }
}

/// Record sink selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log each delivery
    #[default]
    Log,
    /// POST each delivery as a FHIR Bundle
    Http,
}

/// Record sink configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,

    /// Required when `kind = "http"`
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,
}

impl SinkConfig {
    fn validate(&self) -> Result<(), String> {
        if self.kind != SinkKind::Http {
            return Ok(());
        }

        match self.endpoint.as_deref() {
            None | Some("") => {
                return Err("sink.endpoint is required when sink.kind = 'http'".to_string())
            }
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                return Err("sink.endpoint must start with http:// or https://".to_string())
            }
            Some(_) => {}
        }

        if self.username.is_some() != self.password.is_some() {
            return Err("sink.username and sink.password must be set together".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

/// Seed facility table written by `triage init`
pub fn default_tenants() -> BTreeMap<String, i64> {
    BTreeMap::from([
        ("1".to_string(), 1001),
        ("MDA".to_string(), 1002),
        ("PSJ".to_string(), 1003),
    ])
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:2575".to_string()
}

fn default_max_frame_bytes() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_encounter_search_path() -> String {
    "api/FHIR/STU3/Encounter".to_string()
}

fn default_max_attempts() -> usize {
    5
}

fn default_backoff_ms() -> u64 {
    2000
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_max_concurrency() -> usize {
    16
}

fn default_lookback_days() -> u32 {
    7
}

fn default_local_path() -> String {
    "/var/log/triage".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
