//! HTTP record sink
//!
//! Each delivery is POSTed as a FHIR `Bundle` of type `collection`, with HTTP
//! basic authentication when credentials are configured.

use super::{RecordDelivery, RecordSink, SinkAck};
use crate::config::{SecretString, SinkConfig};
use crate::domain::{Result, TriageError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::time::Duration;

const JSON: &str = "application/json";
const TENANT_SYSTEM: &str = "urn:triage:tenant";
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct HttpSink {
    client: Client,
    endpoint: String,
    credentials: Option<(String, SecretString)>,
}

impl HttpSink {
    /// # Errors
    ///
    /// Returns [`TriageError::Configuration`] without an endpoint or when the
    /// HTTP client cannot be built.
    pub fn new(config: &SinkConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| TriageError::Configuration("sink.endpoint is required".to_string()))?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TriageError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let credentials = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }
}

/// Wraps a delivery in a `collection` Bundle tagged with the tenant
pub fn to_bundle(delivery: &RecordDelivery) -> Value {
    let entries: Vec<Value> = delivery
        .resources
        .iter()
        .map(|resource| json!({ "resource": resource }))
        .collect();

    json!({
        "resourceType": "Bundle",
        "id": delivery.message_id.to_string(),
        "type": "collection",
        "meta": {
            "tag": [{ "system": TENANT_SYSTEM, "code": delivery.tenant.to_string() }]
        },
        "identifier": { "system": "urn:fhir:patient", "value": delivery.fhir_id.as_str() },
        "total": entries.len(),
        "entry": entries
    })
}

#[async_trait]
impl RecordSink for HttpSink {
    async fn submit(&self, delivery: RecordDelivery) -> Result<SinkAck> {
        use secrecy::ExposeSecret;

        let bundle = to_bundle(&delivery);
        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .json(&bundle);

        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password.expose_secret().as_str()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TriageError::Sink(format!("Failed to POST to {}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Sink(format!(
                "Sink rejected delivery {} with status {status}: {body}",
                delivery.message_id
            )));
        }

        let reference = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            message_id = %delivery.message_id,
            status = status.as_u16(),
            "Delivered record bundle"
        );

        Ok(SinkAck {
            accepted: delivery.resources.len(),
            reference,
        })
    }
}
