//! Identity/record service adapter
//!
//! - [`service`] - the [`IdentityService`] trait the core depends on
//! - [`client`] - the HTTP implementation with credential caching and retry
//! - [`models`] - wire shapes for tokens and paginated searches

pub mod client;
pub mod models;
pub mod service;

pub use client::IdentityClient;
pub use models::{BearerCredential, SearchPage};
pub use service::{IdentityResult, IdentityService};
