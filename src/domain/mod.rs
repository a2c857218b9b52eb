//! Domain models and types for Triage.
//!
//! This module contains the identifier newtypes, identifier records, tenant
//! context, clinical resources, and the error hierarchy shared by every other
//! layer.
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so an MRN can never be passed where a
//! FHIR id is expected:
//!
//! ```rust
//! use triage::domain::{FhirId, Mrn};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mrn = Mrn::new("123")?;
//! let fhir_id = FhirId::new("fhir12345")?;
//!
//! assert_eq!(mrn.padded(), "0000123");
//! assert_eq!(fhir_id.as_str(), "fhir12345");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], which uses [`TriageError`]:
//!
//! ```rust
//! use triage::domain::{Result, TriageError};
//!
//! fn example() -> Result<()> {
//!     let config = triage::config::TriageConfig::from_file("triage.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod identifiers;
pub mod ids;
pub mod resource;
pub mod result;
pub mod tenant;

// Re-export commonly used types for convenience
pub use errors::{IdentityError, MessageError, TriageError};
pub use identifiers::{IdentifierRecord, IdentifierType, PatientIdentifierSet};
pub use ids::{FacilityCode, FhirId, Mrn, TenantId};
pub use resource::Resource;
pub use result::Result;
pub use tenant::TenantContext;
