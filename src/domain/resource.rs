//! Clinical resources returned by the record service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured clinical data object (e.g. an Encounter)
///
/// The pipeline never interprets resources beyond a few accessors used for
/// logging, so the JSON is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Value);

impl Resource {
    /// Wraps a JSON value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The resource `id`, if present
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The `resourceType`, if present
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(Value::as_str)
    }

    /// `period.start` for resources that carry a period
    pub fn period_start(&self) -> Option<&str> {
        self.0
            .get("period")
            .and_then(|period| period.get("start"))
            .and_then(Value::as_str)
    }

    /// Borrow the underlying JSON
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Consumes self and returns the underlying JSON
    pub fn into_json(self) -> Value {
        self.0
    }
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
