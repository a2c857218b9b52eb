//! CLI command implementations
//!
//! Exit codes shared by the commands:
//!
//! | Code | Meaning                         |
//! |------|---------------------------------|
//! | 0    | Success                         |
//! | 1    | Completed with failed items     |
//! | 2    | Configuration error             |
//! | 4    | Connection or bind error        |
//! | 5    | Fatal error                     |

pub mod init;
pub mod replay;
pub mod serve;
pub mod validate;

use crate::config::{load_config, TriageConfig};

/// Loads and validates the configuration, printing the failure if any
pub(crate) fn load_valid_config(config_path: &str) -> Result<TriageConfig, i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, config_path = %config_path, "Failed to load configuration");
            eprintln!("Failed to load configuration: {e}");
            return Err(2);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        eprintln!("Invalid configuration: {e}");
        return Err(2);
    }

    Ok(config)
}
