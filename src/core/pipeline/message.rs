//! The unit of work flowing through the pipeline stages

use crate::domain::{FhirId, TenantId};
use crate::hl7::Message;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Context accumulated while a message moves through the stages
///
/// Each header is written at most once. There is no way to clear or replace
/// a header after it has been set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    message_type: Option<String>,
    tenant: Option<TenantId>,
    resolved_id: Option<FhirId>,
}

impl Headers {
    pub fn message_type(&self) -> Option<&str> {
        self.message_type.as_deref()
    }

    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant
    }

    pub fn resolved_id(&self) -> Option<&FhirId> {
        self.resolved_id.as_ref()
    }

    /// Returns `false` and keeps the existing value if already set
    pub fn insert_message_type(&mut self, message_type: String) -> bool {
        insert_once(&mut self.message_type, message_type)
    }

    /// Returns `false` and keeps the existing value if already set
    pub fn insert_tenant(&mut self, tenant: TenantId) -> bool {
        insert_once(&mut self.tenant, tenant)
    }

    /// Returns `false` and keeps the existing value if already set
    pub fn insert_resolved_id(&mut self, resolved_id: FhirId) -> bool {
        insert_once(&mut self.resolved_id, resolved_id)
    }
}

fn insert_once<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

/// A parsed message plus its pipeline context
#[derive(Debug, Clone)]
pub struct PipelineMessage {
    id: Uuid,
    received_at: DateTime<Utc>,
    message: Arc<Message>,
    pub headers: Headers,
}

impl PipelineMessage {
    pub fn new(message: Arc<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            message,
            headers: Headers::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn message(&self) -> &Message {
        &self.message
    }
}
