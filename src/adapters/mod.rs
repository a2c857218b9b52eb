//! External system integrations for Triage.
//!
//! - [`identity`] - Identity and record HTTP service (bearer credential, paged search)
//! - [`sink`] - Destinations for aggregated record sets
//! - [`mllp`] - Inbound TCP transport for HL7 messages
//!
//! # Design Pattern
//!
//! Adapters sit behind traits ([`identity::IdentityService`],
//! [`sink::RecordSink`]) so the core pipeline can be driven by mock
//! implementations in tests.
//!
//! ```rust,no_run
//! use triage::adapters::identity::{IdentityClient, IdentityService};
//! use triage::config::IdentityConfig;
//! use triage::domain::Mrn;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IdentityClient::new(&IdentityConfig::default())?;
//! let identifiers = client.lookup_identifiers_by_mrn(&Mrn::new("123")?).await?;
//! println!("{:?}", identifiers.fhir_stu3_id());
//! # Ok(())
//! # }
//! ```

pub mod identity;
pub mod mllp;
pub mod sink;
