//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow through the pipeline. Each
//! type keeps the raw string (or number) and refuses empty input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width the identity service expects MRNs to be left-padded to
pub const MRN_WIDTH: usize = 7;

/// Tenant identifier
///
/// A logical customer boundary multiplexed over the shared pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    /// Creates a new tenant id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Sending facility code (MSH-4.1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityCode(String);

impl FacilityCode {
    /// Creates a new facility code
    ///
    /// # Returns
    ///
    /// Returns `Ok(FacilityCode)` if the code is not blank, `Err` otherwise
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err("Facility code cannot be empty".to_string());
        }
        Ok(Self(code))
    }

    /// Returns the facility code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FacilityCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Medical record number
///
/// # Examples
///
/// ```
/// use triage::domain::ids::Mrn;
///
/// let mrn = Mrn::new("123").unwrap();
/// assert_eq!(mrn.padded(), "0000123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mrn(String);

impl Mrn {
    /// Creates a new MRN
    pub fn new(mrn: impl Into<String>) -> Result<Self, String> {
        let mrn = mrn.into();
        if mrn.trim().is_empty() {
            return Err("MRN cannot be empty".to_string());
        }
        Ok(Self(mrn))
    }

    /// Returns the raw MRN
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Left-pads the MRN with '0' to [`MRN_WIDTH`] characters
    ///
    /// Values already at or above the width are returned unchanged.
    pub fn padded(&self) -> String {
        format!("{:0>width$}", self.0, width = MRN_WIDTH)
    }
}

impl fmt::Display for Mrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Mrn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Canonical external (FHIR STU3) patient identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FhirId(String);

impl FhirId {
    /// Creates a new FHIR id
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("FHIR ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the FHIR id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FhirId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FhirId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
