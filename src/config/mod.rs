//! Configuration management for Triage.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `TRIAGE_*`
//! environment overrides, defaults for optional settings, and validation on
//! load.
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`ListenerConfig`] - MLLP bind address and frame limit
//! - [`IdentityConfig`] - identity/record service endpoints, credentials, retry
//! - `tenants` - facility code → tenant id table
//! - [`PipelineConfig`] - queue bounds, concurrency, search window
//! - [`SinkConfig`] - record delivery target
//! - [`LoggingConfig`] - file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [identity]
//! sts_endpoint = "https://sts.example.com/api/token"
//! api_endpoint = "https://api.example.com/oc/"
//! username = "triage"
//! password = "${TRIAGE_IDENTITY_PASSWORD}"
//! app_name = "triage"
//! app_key = "${TRIAGE_IDENTITY_APP_KEY}"
//!
//! [tenants]
//! "1" = 1001
//! MDA = 1002
//! PSJ = 1003
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use triage::config::load_config;
//!
//! # fn example() {
//! match load_config("triage.toml") {
//!     Ok(config) => println!("{} tenant(s) configured", config.tenants.len()),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    default_tenants, ApplicationConfig, IdentityConfig, ListenerConfig, LoggingConfig,
    PipelineConfig, RetryConfig, SinkConfig, SinkKind, TriageConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
