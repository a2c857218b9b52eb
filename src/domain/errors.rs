//! Domain error types
//!
//! This module defines the error hierarchy for Triage. Errors raised by the
//! HL7 navigation layer and by the identity service client are kept as
//! separate enums so that the pipeline can tell a structural message failure
//! apart from a downstream service failure. None of the variants expose
//! third-party HTTP client types.

use thiserror::Error;

/// Main Triage error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HL7 message structure errors
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Identity/record service errors
    #[error("Identity service error: {0}")]
    Identity(#[from] IdentityError),

    /// Outbound record sink errors
    #[error("Record sink error: {0}")]
    Sink(String),

    /// Inbound transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Pipeline hand-off errors (queue closed, worker gone)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Structural HL7 errors
///
/// "Not present" is never an error: absent segments, fields and components
/// navigate to `None`. These variants are reserved for input that cannot be
/// turned into a message tree, or a tree that cannot be addressed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The ER7 text could not be parsed
    #[error("Failed to parse HL7 message: {0}")]
    Parse(String),

    /// The message or address cannot be navigated
    #[error("Malformed HL7 message: {0}")]
    Malformed(String),
}

/// Identity/record service errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Credential fetch exhausted its retries
    #[error("Identity service unavailable after {attempts} attempt(s): {reason}")]
    ServiceUnavailable { attempts: usize, reason: String },

    /// Any call returned something other than 200
    #[error("Unexpected status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// MRN lookup did not succeed
    #[error("Unable to resolve identifiers for MRN {mrn}: server returned {status}")]
    ResolutionFailed { mrn: String, status: u16 },

    /// Failed to reach the service
    #[error("Failed to connect to identity service: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Response body did not have the expected shape
    #[error("Invalid response from identity service: {0}")]
    InvalidResponse(String),
}

impl IdentityError {
    /// Whether the credential fetch should be attempted again
    ///
    /// Only network-level failures and 5xx responses are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            IdentityError::ConnectionFailed(_) | IdentityError::Timeout(_) => true,
            IdentityError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IdentityError::Timeout(err.to_string())
        } else if err.is_decode() {
            IdentityError::InvalidResponse(err.to_string())
        } else {
            IdentityError::ConnectionFailed(err.to_string())
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for TriageError {
    fn from(err: std::io::Error) -> Self {
        TriageError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        TriageError::Configuration(format!("TOML parse error: {err}"))
    }
}
