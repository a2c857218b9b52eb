//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! JSON file layer with rotation.
//!
//! # Example
//!
//! ```no_run
//! use triage::logging::init_logging;
//! use triage::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(tenant = 1002, "Message queued");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use triage::log_retry_attempt;
///
/// log_retry_attempt!(2, 5, "Connection refused");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log a normal early halt of a pipeline item
///
/// # Example
///
/// ```no_run
/// use triage::log_stage_halt;
///
/// let message_id = uuid::Uuid::new_v4();
/// log_stage_halt!("tenant", message_id, "unknown facility code");
/// ```
#[macro_export]
macro_rules! log_stage_halt {
    ($stage:expr, $message_id:expr, $reason:expr) => {
        tracing::info!(
            stage = $stage,
            message_id = %$message_id,
            reason = %$reason,
            "Pipeline halted"
        );
    };
}

/// Log a failed pipeline item with context
///
/// # Example
///
/// ```no_run
/// use triage::log_stage_failure;
/// use triage::domain::TriageError;
///
/// let error = TriageError::Pipeline("queue closed".to_string());
/// log_stage_failure!("identity", uuid::Uuid::new_v4(), &error);
/// ```
#[macro_export]
macro_rules! log_stage_failure {
    ($stage:expr, $message_id:expr, $error:expr) => {
        tracing::error!(
            stage = $stage,
            message_id = %$message_id,
            error = %$error,
            "Pipeline item failed"
        );
    };
}
