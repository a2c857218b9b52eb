//! Outbound record sink
//!
//! The last pipeline stage hands every aggregated record set to a
//! [`RecordSink`]. Two implementations exist:
//!
//! - [`LogSink`] - logs a summary of each delivery (default)
//! - [`HttpSink`] - POSTs each delivery as a FHIR `Bundle`

pub mod http;
pub mod log;

pub use self::http::HttpSink;
pub use self::log::LogSink;

use crate::config::{SinkConfig, SinkKind};
use crate::domain::{FhirId, Resource, Result, TenantId};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Records aggregated for one inbound message
#[derive(Debug, Clone, Serialize)]
pub struct RecordDelivery {
    pub message_id: Uuid,
    pub message_type: String,
    pub tenant: TenantId,
    pub fhir_id: FhirId,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub resources: Vec<Resource>,
}

/// Acknowledgment returned by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkAck {
    /// Number of resources the sink accepted
    pub accepted: usize,

    /// Sink-side reference for the delivery, if one was returned
    pub reference: Option<String>,
}

/// Destination for aggregated records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Delivers one record set
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TriageError::Sink`] if the delivery was not
    /// accepted.
    async fn submit(&self, delivery: RecordDelivery) -> Result<SinkAck>;
}

/// Builds the sink selected by configuration
pub fn from_config(config: &SinkConfig) -> Result<Arc<dyn RecordSink>> {
    match config.kind {
        SinkKind::Log => Ok(Arc::new(LogSink)),
        SinkKind::Http => Ok(Arc::new(HttpSink::new(config)?)),
    }
}
