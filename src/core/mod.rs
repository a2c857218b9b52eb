//! Core routing logic for Triage.
//!
//! # Modules
//!
//! - [`classify`] - Message type derivation from MSH-9
//! - [`tenant`] - Facility code to tenant resolution
//! - [`patient_id`] - PID identifier extraction and FHIR id lookup
//! - [`records`] - Encounter search over a lookback window
//! - [`pipeline`] - The three stages and the queues between them
//!
//! # Pipeline Workflow
//!
//! 1. **Classify**: Derive `category^event` from MSH-9
//! 2. **Route**: Map MSH-4 to a tenant, or halt and acknowledge
//! 3. **Resolve**: Exchange the MRN for the FHIR STU3 patient id
//! 4. **Aggregate**: Page through encounters in the search window
//! 5. **Deliver**: Hand the record set to the configured sink
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use triage::config::load_config;
//! use triage::core::pipeline::{Pipeline, PipelineServices};
//! use triage::hl7::Message;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("triage.toml")?;
//! let services = PipelineServices::from_config(&config)?;
//! let (pipeline, router) = Pipeline::start(services, &config.pipeline);
//!
//! let message = Message::parse("MSH|^~\\&|EPIC|MDA|||||ADT^A01|1|P|2.6\rPID|1||MRN123^^^MDA^MR")?;
//! let outcome = router.ingest(Arc::new(message)).await?;
//! println!("{}", outcome.ack().encode());
//!
//! drop(router);
//! let summary = pipeline.shutdown().await;
//! println!("Delivered: {}", summary.delivered);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod patient_id;
pub mod pipeline;
pub mod records;
pub mod tenant;
