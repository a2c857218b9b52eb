//! Patient identifier records
//!
//! Identifier records come from two places: the CX fields of an inbound PID
//! segment, and the identity service's identifier lookup. Both carry an id
//! and an identifier type code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier type used by the identity service for the canonical id
pub const FHIR_STU3_ID_TYPE: &str = "FHIR STU3";

/// Identifier type code for medical record numbers (HL7 table 0203)
pub const MRN_TYPE_CODE: &str = "MR";

/// A single `{id, idType}` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// Identifier value
    pub id: String,

    /// Identifier type, e.g. `MRN` or `FHIR STU3`
    #[serde(rename = "idType")]
    pub id_type: String,
}

impl IdentifierRecord {
    /// Creates a new identifier record
    pub fn new(id: impl Into<String>, id_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_type: id_type.into(),
        }
    }
}

/// Ordered identifier list as returned by the MRN lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentifierSet {
    /// Current identifiers
    #[serde(default)]
    pub identifiers: Vec<IdentifierRecord>,

    /// Retired identifiers; returned by the service but never consulted
    #[serde(default, rename = "historicalIdentifiers")]
    pub historical_identifiers: Vec<IdentifierRecord>,
}

impl PatientIdentifierSet {
    /// Creates a set from current identifiers
    pub fn new(identifiers: Vec<IdentifierRecord>) -> Self {
        Self {
            identifiers,
            historical_identifiers: Vec::new(),
        }
    }

    /// Number of current identifiers
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether the set has no current identifiers
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// First identifier whose type matches `id_type`, ignoring ASCII case
    pub fn find_by_type(&self, id_type: &str) -> Option<&IdentifierRecord> {
        self.identifiers
            .iter()
            .find(|record| record.id_type.eq_ignore_ascii_case(id_type))
    }

    /// The canonical FHIR STU3 identifier, if the service returned one
    pub fn fhir_stu3_id(&self) -> Option<&str> {
        self.find_by_type(FHIR_STU3_ID_TYPE)
            .map(|record| record.id.as_str())
    }
}

/// Identifier type code classification (HL7 table 0203)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierType {
    /// Medical record number
    MedicalRecordNumber,
    /// Social security number
    SocialSecurityNumber,
    /// Driver's license number
    DriversLicense,
    /// Passport number
    Passport,
    /// Account number
    AccountNumber,
    /// Person number
    PersonNumber,
    /// Any other code, kept verbatim
    Other(String),
}

impl IdentifierType {
    /// Classifies a raw type code
    pub fn from_code(code: &str) -> Self {
        match code {
            "MR" => IdentifierType::MedicalRecordNumber,
            "SS" => IdentifierType::SocialSecurityNumber,
            "DL" => IdentifierType::DriversLicense,
            "PPN" => IdentifierType::Passport,
            "AN" => IdentifierType::AccountNumber,
            "PN" => IdentifierType::PersonNumber,
            other => IdentifierType::Other(other.to_string()),
        }
    }

    /// The table 0203 code
    pub fn code(&self) -> &str {
        match self {
            IdentifierType::MedicalRecordNumber => "MR",
            IdentifierType::SocialSecurityNumber => "SS",
            IdentifierType::DriversLicense => "DL",
            IdentifierType::Passport => "PPN",
            IdentifierType::AccountNumber => "AN",
            IdentifierType::PersonNumber => "PN",
            IdentifierType::Other(code) => code,
        }
    }

    /// Whether the code is one of the recognized table 0203 codes
    pub fn is_recognized(&self) -> bool {
        !matches!(self, IdentifierType::Other(_))
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_identifier_set() {
        let json = r#"{ "historicalIdentifiers": [], "identifiers": [
            { "id": "MRN123", "idType": "MRN" },
            { "id": "fhir12345", "idType": "FHIR STU3" } ] }"#;

        let set: PatientIdentifierSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.fhir_stu3_id(), Some("fhir12345"));
    }

    #[test]
    fn test_fhir_lookup_is_case_insensitive_and_first_wins() {
        let set = PatientIdentifierSet::new(vec![
            IdentifierRecord::new("first", "fhir stu3"),
            IdentifierRecord::new("second", "FHIR STU3"),
        ]);
        assert_eq!(set.fhir_stu3_id(), Some("first"));
    }

    #[test]
    fn test_missing_fhir_id() {
        let set = PatientIdentifierSet::new(vec![IdentifierRecord::new("MRN123", "MRN")]);
        assert_eq!(set.fhir_stu3_id(), None);
        assert!(PatientIdentifierSet::default().is_empty());
    }

    #[test]
    fn test_identifier_type_classification() {
        assert_eq!(
            IdentifierType::from_code("MR"),
            IdentifierType::MedicalRecordNumber
        );
        assert_eq!(IdentifierType::from_code("PPN").code(), "PPN");
        let other = IdentifierType::from_code("XX");
        assert!(!other.is_recognized());
        assert_eq!(other.to_string(), "XX");
    }
}
