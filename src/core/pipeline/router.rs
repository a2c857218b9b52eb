//! Stage 1: classification and tenant routing
//!
//! Runs inline on the receiving task so the acknowledgment can be returned
//! straight away. Work after the tenant hand-off is asynchronous.

use super::message::PipelineMessage;
use super::summary::{bump, PipelineStats};
use crate::core::classify::MessageClassifier;
use crate::core::tenant::TenantResolver;
use crate::domain::{FacilityCode, Result, TenantContext, TriageError};
use crate::hl7::{Acknowledgment, Message};
use crate::log_stage_halt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What stage 1 did with a message
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// No tenant; nothing was handed off
    Stopped { message_id: Uuid, ack: Acknowledgment },

    /// Handed to the identity stage
    Queued { message_id: Uuid, ack: Acknowledgment },
}

impl IngestOutcome {
    pub fn message_id(&self) -> Uuid {
        match self {
            Self::Stopped { message_id, .. } | Self::Queued { message_id, .. } => *message_id,
        }
    }

    pub fn ack(&self) -> &Acknowledgment {
        match self {
            Self::Stopped { ack, .. } | Self::Queued { ack, .. } => ack,
        }
    }

    pub fn into_ack(self) -> Acknowledgment {
        match self {
            Self::Stopped { ack, .. } | Self::Queued { ack, .. } => ack,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// Entry point of the pipeline
///
/// Cheap to clone; every clone feeds the same identity queue. The pipeline
/// drains only once every clone has been dropped.
#[derive(Clone)]
pub struct Router {
    tenants: TenantResolver,
    identity_tx: mpsc::Sender<PipelineMessage>,
    stats: Arc<PipelineStats>,
}

impl Router {
    pub(crate) fn new(
        tenants: TenantResolver,
        identity_tx: mpsc::Sender<PipelineMessage>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            tenants,
            identity_tx,
            stats,
        }
    }

    /// Classifies the message, resolves its tenant and hands it off
    ///
    /// Both outcomes carry an `AA` acknowledgment. A message without a tenant
    /// is a normal halt, not an error. Waits only when the identity queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be navigated or the identity
    /// stage has shut down.
    pub async fn ingest(&self, message: Arc<Message>) -> Result<IngestOutcome> {
        bump(&self.stats.received);

        let mut item = PipelineMessage::new(message);
        let message_id = item.id();

        let routed = self.route(&mut item);
        let context = match routed {
            Ok(context) => context,
            Err(e) => {
                bump(&self.stats.failed_routing);
                return Err(e);
            }
        };

        let ack = Acknowledgment::accept(item.message());

        let Some(tenant) = context.tenant_id() else {
            bump(&self.stats.halted_no_tenant);
            log_stage_halt!(
                "tenant",
                message_id,
                format!(
                    "no tenant for facility code '{}'",
                    context.facility_code().map(FacilityCode::as_str).unwrap_or_default()
                )
            );
            return Ok(IngestOutcome::Stopped { message_id, ack });
        };

        item.headers.insert_tenant(tenant);

        tracing::debug!(
            message_id = %message_id,
            tenant = %tenant,
            message_type = item.headers.message_type().unwrap_or_default(),
            "Message routed"
        );

        if self.identity_tx.send(item).await.is_err() {
            bump(&self.stats.failed_routing);
            return Err(TriageError::Pipeline(
                "Identity stage is no longer accepting messages".to_string(),
            ));
        }
        bump(&self.stats.queued_identity);

        Ok(IngestOutcome::Queued { message_id, ack })
    }

    fn route(&self, item: &mut PipelineMessage) -> Result<TenantContext> {
        let message_type = MessageClassifier::classify(item.message())?;
        item.headers.insert_message_type(message_type);
        Ok(self.tenants.tenant_context(item.message())?)
    }
}
