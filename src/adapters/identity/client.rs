//! HTTP client for the identity/record service
//!
//! # Authentication
//!
//! The service issues an opaque bearer token from a separate token endpoint:
//! - POST `{Username, Password, AppName, AppKey, scope: "read"}` as JSON
//! - The response body is the token
//!
//! The token is fetched on the first authenticated call and cached for the
//! life of the client. Concurrent first callers share a single fetch.

use super::models::{BearerCredential, SearchPage, TokenRequest};
use super::service::{IdentityResult, IdentityService};
use crate::config::{IdentityConfig, RetryConfig, SecretString};
use crate::domain::{IdentityError, Mrn, PatientIdentifierSet, Resource, Result, TriageError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

const JSON: &str = "application/json";
const TOKEN_SCOPE: &str = "read";

/// Identity/record service client
pub struct IdentityClient {
    /// HTTP client for making requests
    client: Client,

    /// Base for relative paths, without a trailing '/'
    api_endpoint: String,

    sts_endpoint: String,
    username: String,
    password: SecretString,
    app_name: String,
    app_key: SecretString,
    retry: RetryConfig,

    /// Set once by the first successful token fetch
    credential: OnceCell<BearerCredential>,
}

impl IdentityClient {
    /// Creates a client from configuration
    ///
    /// No request is made until the first lookup.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .build()
            .map_err(|e| TriageError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            sts_endpoint: config.sts_endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            app_name: config.app_name.clone(),
            app_key: config.app_key.clone(),
            retry: config.retry.clone(),
            credential: OnceCell::new(),
        })
    }

    /// Resolves a path against the API endpoint
    ///
    /// Absolute `http(s)` URLs are returned unchanged.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.api_endpoint, path.trim_start_matches('/'))
    }

    /// Identifier lookup URL for an MRN
    ///
    /// The padded MRN is a single percent-encoded path segment.
    pub fn identifiers_url(&self, mrn: &Mrn) -> IdentityResult<String> {
        let invalid = |reason: String| {
            IdentityError::ConnectionFailed(format!(
                "Invalid API endpoint {}: {reason}",
                self.api_endpoint
            ))
        };

        let padded = mrn.padded();
        let mut url = Url::parse(&self.api_endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["patient", padded.as_str(), "identifiers", "type", "MRN"]);

        Ok(url.to_string())
    }

    /// Whether a bearer credential has been cached
    pub fn has_credential(&self) -> bool {
        self.credential.initialized()
    }

    async fn credential(&self) -> IdentityResult<&BearerCredential> {
        self.credential
            .get_or_try_init(|| self.fetch_credential_with_retry())
            .await
    }

    /// Fetches a token, retrying transient failures with a fixed delay
    async fn fetch_credential_with_retry(&self) -> IdentityResult<BearerCredential> {
        let max_attempts = self.retry.max_attempts.max(1);
        let backoff = Duration::from_millis(self.retry.backoff_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_credential().await {
                Ok(credential) => {
                    tracing::info!(attempt, "Acquired identity service credential");
                    return Ok(credential);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    tracing::error!(attempts = attempt, error = %e, "Credential fetch exhausted retries");
                    return Err(IdentityError::ServiceUnavailable {
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    log_retry_attempt!(attempt, max_attempts, e);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn fetch_credential(&self) -> IdentityResult<BearerCredential> {
        use secrecy::ExposeSecret;

        tracing::debug!(
            sts_endpoint = %self.sts_endpoint,
            username = %self.username,
            app_name = %self.app_name,
            "Requesting identity service token"
        );

        let body = TokenRequest {
            username: &self.username,
            password: self.password.expose_secret().as_str(),
            app_name: &self.app_name,
            app_key: self.app_key.expose_secret().as_str(),
            scope: TOKEN_SCOPE,
        };

        let response = self
            .client
            .post(&self.sts_endpoint)
            .header(ACCEPT, JSON)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status != StatusCode::OK {
            return Err(IdentityError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.sts_endpoint.clone(),
                body: text,
            });
        }

        BearerCredential::from_body(&text).ok_or_else(|| {
            IdentityError::InvalidResponse("Token endpoint returned an empty token".to_string())
        })
    }

    /// Issues an authenticated GET and deserializes a 200 response
    ///
    /// # Errors
    ///
    /// Any status other than 200 yields [`IdentityError::UnexpectedStatus`];
    /// it is not retried.
    pub async fn authenticated_get<T: DeserializeOwned>(&self, path: &str) -> IdentityResult<T> {
        let credential = self.credential().await?;
        let url = self.resolve_url(path);

        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, credential.header_value())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::UnexpectedStatus {
                status: status.as_u16(),
                url,
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::InvalidResponse(format!("{url}: {e}")))
    }
}

#[async_trait]
impl IdentityService for IdentityClient {
    async fn lookup_identifiers_by_mrn(&self, mrn: &Mrn) -> IdentityResult<PatientIdentifierSet> {
        let url = self.identifiers_url(mrn)?;

        match self.authenticated_get::<PatientIdentifierSet>(&url).await {
            Ok(identifiers) => {
                tracing::debug!(count = identifiers.len(), "Received patient identifiers");
                Ok(identifiers)
            }
            Err(IdentityError::UnexpectedStatus { status, .. }) => {
                Err(IdentityError::ResolutionFailed {
                    mrn: mrn.to_string(),
                    status,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn search_paged(&self, initial_path: &str) -> IdentityResult<Vec<Resource>> {
        let mut resources = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.resolve_url(initial_path));
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(url = %url, pages, "Next link repeats an earlier page; stopping");
                break;
            }

            let page: SearchPage = self.authenticated_get(&url).await?;
            pages += 1;
            next = page.next_url().map(str::to_string);
            resources.extend(page.into_resources());
        }

        tracing::debug!(pages, count = resources.len(), "Search complete");
        Ok(resources)
    }
}
