//! Identity service trait definition
//!
//! The core resolvers depend on this trait rather than on the HTTP client, so
//! tests and alternative backends can stand in for the real service.

use crate::domain::{IdentityError, Mrn, PatientIdentifierSet, Resource};
use async_trait::async_trait;

/// Result alias for identity service calls
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

/// Typed lookups against the external identity/record service
///
/// # Example
///
/// ```no_run
/// use triage::adapters::identity::{IdentityClient, IdentityService};
/// use triage::config::IdentityConfig;
/// use triage::domain::Mrn;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = IdentityClient::new(&IdentityConfig::default())?;
/// let identifiers = client.lookup_identifiers_by_mrn(&Mrn::new("123")?).await?;
/// println!("FHIR id: {:?}", identifiers.fhir_stu3_id());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Fetches every identifier known for an MRN
    ///
    /// The MRN is zero-padded to seven characters before the path is built.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::ResolutionFailed`] on a non-200 response, and
    /// propagates credential and transport errors unchanged.
    async fn lookup_identifiers_by_mrn(&self, mrn: &Mrn) -> IdentityResult<PatientIdentifierSet>;

    /// Runs a search and follows `next` links until none remain
    ///
    /// Resources are returned in page order, then entry order.
    async fn search_paged(&self, initial_path: &str) -> IdentityResult<Vec<Resource>>;
}
