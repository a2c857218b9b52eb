//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Triage configuration file.

use crate::config::{load_config, SinkKind};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Listener: {}", config.listener.bind_address);
                println!("  Token Endpoint: {}", config.identity.sts_endpoint);
                println!("  API Endpoint: {}", config.identity.api_endpoint);
                println!("  Encounter Search: {}", config.identity.encounter_search_path);
                println!(
                    "  Retry: {} attempts, {}ms backoff",
                    config.identity.retry.max_attempts, config.identity.retry.backoff_ms
                );
                println!("  Tenants:");
                for (facility, tenant) in &config.tenants {
                    println!("    {facility} → {tenant}");
                }
                println!("  Queue Capacity: {}", config.pipeline.queue_capacity);
                println!("  Max Concurrency: {}", config.pipeline.max_concurrency);
                println!("  Lookback Days: {}", config.pipeline.lookback_days);
                match config.sink.kind {
                    SinkKind::Log => println!("  Sink: log"),
                    SinkKind::Http => println!(
                        "  Sink: http ({})",
                        config.sink.endpoint.as_deref().unwrap_or("")
                    ),
                }
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let code = ValidateArgs {}
            .execute("/nonexistent/triage.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_generated_config_is_valid() {
        let mut file = NamedTempFile::new().unwrap();
        let text = super::super::init::InitArgs::generate_config()
            .replace("${TRIAGE_IDENTITY_PASSWORD}", "secret")
            .replace("${TRIAGE_IDENTITY_APP_KEY}", "key");
        file.write_all(text.as_bytes()).unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }
}
