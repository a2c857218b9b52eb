//! Tenant resolution
//!
//! The sending facility (MSH-4.1) is mapped to a tenant through an injected
//! [`TenantLookup`]. An absent or unknown facility code yields no tenant; the
//! router treats that as a normal halt.

use crate::domain::{FacilityCode, MessageError, TenantContext, TenantId};
use crate::hl7::{navigator, FieldPath, Message};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Facility code → tenant mapping
pub trait TenantLookup: Send + Sync {
    /// Tenant for an exact facility code
    fn tenant_for(&self, facility_code: &FacilityCode) -> Option<TenantId>;
}

/// In-memory tenant table, normally built from the `[tenants]` config section
#[derive(Debug, Clone, Default)]
pub struct TenantDirectory {
    tenants: HashMap<String, TenantId>,
}

impl TenantDirectory {
    pub fn new(tenants: impl IntoIterator<Item = (String, TenantId)>) -> Self {
        Self {
            tenants: tenants.into_iter().collect(),
        }
    }

    /// Builds the directory from the configured table
    pub fn from_config(table: &BTreeMap<String, i64>) -> Self {
        Self::new(
            table
                .iter()
                .map(|(code, id)| (code.clone(), TenantId::new(*id))),
        )
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl TenantLookup for TenantDirectory {
    fn tenant_for(&self, facility_code: &FacilityCode) -> Option<TenantId> {
        self.tenants.get(facility_code.as_str()).copied()
    }
}

/// Resolves the tenant of an inbound message
#[derive(Clone)]
pub struct TenantResolver {
    lookup: Arc<dyn TenantLookup>,
}

impl TenantResolver {
    pub fn new(lookup: Arc<dyn TenantLookup>) -> Self {
        Self { lookup }
    }

    /// MSH-4[0].1, if present and not blank
    pub fn facility_code(message: &Message) -> Result<Option<FacilityCode>, MessageError> {
        Ok(navigator::get(message, &FieldPath::new("MSH", 4))?
            .and_then(|code| FacilityCode::new(code).ok()))
    }

    /// Tenant for the message's sending facility
    pub fn resolve_tenant(&self, message: &Message) -> Result<Option<TenantId>, MessageError> {
        Ok(self.tenant_context(message)?.tenant_id())
    }

    /// Facility code and tenant together
    pub fn tenant_context(&self, message: &Message) -> Result<TenantContext, MessageError> {
        let code = Self::facility_code(message)?;
        let tenant = code.as_ref().and_then(|code| self.lookup.tenant_for(code));
        Ok(TenantContext::new(code, tenant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_tenants;
    use test_case::test_case;

    fn resolver() -> TenantResolver {
        TenantResolver::new(Arc::new(TenantDirectory::from_config(&default_tenants())))
    }

    fn message(facility: &str) -> Message {
        Message::parse(&format!("MSH|^~\\&|EPIC|{facility}|||||ADT^A01|1|P|2.6")).unwrap()
    }

    #[test_case("1", Some(1001) ; "numeric facility")]
    #[test_case("MDA", Some(1002) ; "mda")]
    #[test_case("PSJ", Some(1003) ; "psj")]
    #[test_case("mda", None ; "codes are case sensitive")]
    #[test_case("XYZ", None ; "unknown facility")]
    #[test_case("", None ; "absent facility")]
    fn test_resolve_tenant(facility: &str, expected: Option<i64>) {
        let tenant = resolver().resolve_tenant(&message(facility)).unwrap();
        assert_eq!(tenant, expected.map(TenantId::new));
    }

    #[test]
    fn test_only_first_component_is_used() {
        let message = message("MDA^1.2.3^ISO");
        assert_eq!(
            resolver().resolve_tenant(&message).unwrap(),
            Some(TenantId::new(1002))
        );
    }

    #[test]
    fn test_tenant_context() {
        let context = resolver().tenant_context(&message("PSJ")).unwrap();
        assert_eq!(context.facility_code().map(FacilityCode::as_str), Some("PSJ"));
        assert!(context.is_known());

        let context = resolver().tenant_context(&message("")).unwrap();
        assert_eq!(context.facility_code(), None);
        assert!(!context.is_known());
    }

    #[test]
    fn test_resolve_tenant_is_pure() {
        let message = message("MDA");
        let r = resolver();
        assert_eq!(
            r.resolve_tenant(&message).unwrap(),
            r.resolve_tenant(&message).unwrap()
        );
    }
}
