// Triage - HL7 admission routing pipeline
// Copyright (c) 2025 Triage Contributors
// Licensed under the MIT License

//! # Triage - HL7 admission routing pipeline
//!
//! Triage receives HL7 v2 admission messages, works out which tenant and
//! patient each message belongs to, and gathers the patient's recent
//! encounters from an external identity and record service.
//!
//! ## Overview
//!
//! Every inbound message passes through three stages:
//! - **Routing**: classify by MSH-9 and map the sending facility (MSH-4) to a tenant
//! - **Identity**: exchange the patient's MRN for the canonical FHIR STU3 id
//! - **Records**: page through the patient's encounters over a lookback window
//!
//! A message with no tenant, or a patient with no FHIR id, halts quietly.
//! The acknowledgment is produced as soon as routing finishes.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Classification, resolution, aggregation and the pipeline
//! - [`adapters`] - Identity service client, record sinks, MLLP transport
//! - [`hl7`] - Message model, field navigation, acknowledgments
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use triage::config::TriageConfig;
//! use triage::core::pipeline::{Pipeline, PipelineServices};
//! use triage::hl7::Message;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TriageConfig::from_file("triage.toml")?;
//!     let (pipeline, router) =
//!         Pipeline::start(PipelineServices::from_config(&config)?, &config.pipeline);
//!
//!     let message = Message::parse("MSH|^~\\&|EPIC|MDA|||||ADT^A01|1|P|2.6\rPID|1||MRN123^^^MDA^MR")?;
//!     let outcome = router.ingest(Arc::new(message)).await?;
//!     println!("{}", outcome.ack().encode());
//!
//!     drop(router);
//!     pipeline.shutdown().await.log_summary();
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Triage uses the [`domain::TriageError`] type for all errors:
//!
//! ```rust,no_run
//! use triage::domain::TriageError;
//!
//! fn example() -> Result<(), TriageError> {
//!     let config = triage::config::TriageConfig::from_file("triage.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod hl7;
pub mod logging;
