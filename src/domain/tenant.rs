//! Tenant context derived once per inbound message

use super::ids::{FacilityCode, TenantId};
use serde::{Deserialize, Serialize};

/// Facility code and the tenant it maps to
///
/// Built once from MSH-4 and never mutated afterwards. A context without a
/// tenant halts the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    facility_code: Option<FacilityCode>,
    tenant_id: Option<TenantId>,
}

impl TenantContext {
    /// Creates a new tenant context
    pub fn new(facility_code: Option<FacilityCode>, tenant_id: Option<TenantId>) -> Self {
        Self {
            facility_code,
            tenant_id,
        }
    }

    /// The sending facility, absent when MSH-4 was empty
    pub fn facility_code(&self) -> Option<&FacilityCode> {
        self.facility_code.as_ref()
    }

    /// The resolved tenant
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Whether a tenant was resolved
    pub fn is_known(&self) -> bool {
        self.tenant_id.is_some()
    }
}
