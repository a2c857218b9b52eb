//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "triage.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Triage configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set TRIAGE_IDENTITY_PASSWORD and TRIAGE_IDENTITY_APP_KEY");
                println!("  3. Validate configuration: triage validate-config");
                println!("  4. Start the listener: triage serve");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Sample configuration seeded with the default tenant table
    pub fn generate_config() -> String {
        let tenants: String = crate::config::default_tenants()
            .iter()
            .map(|(facility, tenant)| format!("\"{facility}\" = {tenant}\n"))
            .collect();

        format!(
            r#"# Triage Configuration File
# HL7 admission routing pipeline

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# MLLP Listener
# ============================================================================
[listener]
bind_address = "0.0.0.0:2575"

# Frames larger than this close the connection
max_frame_bytes = 1048576

# ============================================================================
# Identity and Record Service
# ============================================================================
[identity]
# Token endpoint (POST)
sts_endpoint = "https://identity.example.com/sts/token"

# Base URL for authenticated requests
api_endpoint = "https://identity.example.com/oc/"

username = "triage"
password = "${{TRIAGE_IDENTITY_PASSWORD}}"
app_name = "triage"
app_key = "${{TRIAGE_IDENTITY_APP_KEY}}"

# Per-request timeout in seconds
timeout_seconds = 30

# Encounter search, relative to api_endpoint
encounter_search_path = "api/FHIR/STU3/Encounter"

# Transient failures (connect errors, timeouts, 5xx) only
[identity.retry]
max_attempts = 5
backoff_ms = 2000

# ============================================================================
# Tenants (sending facility code -> tenant id)
# ============================================================================
[tenants]
{tenants}
# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
queue_capacity = 1000
max_concurrency = 16
lookback_days = 7
# Fixed search window end; defaults to today (UTC)
# window_end = "2021-07-08"

# ============================================================================
# Record Sink
# ============================================================================
[sink]
kind = "log"  # log | http
# endpoint = "https://records.example.com/fhir"
# username = "triage"
# password = "${{TRIAGE_SINK_PASSWORD}}"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
local_enabled = true
local_path = "/var/log/triage"
local_rotation = "daily"  # daily | hourly | never
"#
        )
    }
}
