//! Patient identity resolution
//!
//! Candidate identifiers come from four PID fields:
//!
//! | Field  | Meaning                    | Repeats |
//! |--------|----------------------------|---------|
//! | PID-2  | patient id                 | no      |
//! | PID-3  | patient identifier list    | yes     |
//! | PID-4  | alternate patient id       | yes     |
//! | PID-18 | patient account number     | no      |
//!
//! Each candidate is a CX: component 1 holds the value and component 5 the
//! identifier type code. The `MR` value is looked up against the identity
//! service to find the canonical FHIR STU3 id.

use crate::adapters::identity::IdentityService;
use crate::domain::identifiers::MRN_TYPE_CODE;
use crate::domain::{FhirId, IdentifierType, MessageError, Mrn, Result};
use crate::hl7::{navigator, FieldPath, Message};
use std::collections::HashMap;
use std::sync::Arc;

/// (field, repeats)
const CANDIDATE_FIELDS: [(usize, bool); 4] = [(2, false), (3, true), (4, true), (18, false)];

/// Resolves the canonical external patient id of a message
#[derive(Clone)]
pub struct PatientIdResolver {
    identity: Arc<dyn IdentityService>,
}

impl PatientIdResolver {
    pub fn new(identity: Arc<dyn IdentityService>) -> Self {
        Self { identity }
    }

    /// Builds the type code → value map from the PID candidates
    ///
    /// Candidates without a type code are skipped. When a type appears more
    /// than once the later value replaces the earlier one. A candidate with a
    /// type but no value maps to an empty string.
    pub fn collect_identifiers(message: &Message) -> std::result::Result<HashMap<String, String>, MessageError> {
        let mut identifiers = HashMap::new();

        for (field, repeats) in CANDIDATE_FIELDS {
            let repetitions = if repeats {
                navigator::repetition_count(message, "PID", field)?
            } else {
                1
            };

            for repetition in 0..repetitions {
                let base = FieldPath::new("PID", field).repetition(repetition);
                let Some(id_type) = navigator::get(message, &base.clone().component(5))? else {
                    continue;
                };
                let value = navigator::get(message, &base.component(1))?.unwrap_or_default();

                if !IdentifierType::from_code(&id_type).is_recognized() {
                    tracing::debug!(id_type = %id_type, field, "Unrecognized identifier type");
                }

                if let Some(previous) = identifiers.insert(id_type.clone(), value) {
                    tracing::info!(
                        id_type = %id_type,
                        previous = %previous,
                        "Received second id for type; keeping the later value"
                    );
                }
            }
        }

        Ok(identifiers)
    }

    /// Resolves the FHIR STU3 id for the message's MRN
    ///
    /// Returns `Ok(None)` without calling the service when the message has no
    /// `MR` identifier, and `Ok(None)` when the service knows no FHIR STU3 id.
    ///
    /// # Errors
    ///
    /// Identity service errors propagate unchanged inside
    /// [`crate::domain::TriageError::Identity`].
    pub async fn resolve_fhir_id(&self, message: &Message) -> Result<Option<FhirId>> {
        let identifiers = Self::collect_identifiers(message)?;

        let Some(mrn) = identifiers
            .get(MRN_TYPE_CODE)
            .and_then(|value| Mrn::new(value.as_str()).ok())
        else {
            tracing::debug!("No MRN among patient identifiers");
            return Ok(None);
        };

        let identifier_set = self.identity.lookup_identifiers_by_mrn(&mrn).await?;

        let fhir_id = identifier_set
            .fhir_stu3_id()
            .and_then(|id| FhirId::new(id).ok());
        if fhir_id.is_none() {
            tracing::debug!(
                identifiers = identifier_set.len(),
                "Identity service returned no FHIR STU3 id"
            );
        }
        Ok(fhir_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::IdentityResult;
    use crate::domain::{IdentifierRecord, IdentityError, PatientIdentifierSet, Resource};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIdentity {
        lookups: Mutex<Vec<String>>,
        response: Option<PatientIdentifierSet>,
    }

    #[async_trait]
    impl IdentityService for RecordingIdentity {
        async fn lookup_identifiers_by_mrn(&self, mrn: &Mrn) -> IdentityResult<PatientIdentifierSet> {
            self.lookups.lock().unwrap().push(mrn.to_string());
            self.response
                .clone()
                .ok_or_else(|| IdentityError::ResolutionFailed {
                    mrn: mrn.to_string(),
                    status: 404,
                })
        }

        async fn search_paged(&self, _initial_path: &str) -> IdentityResult<Vec<Resource>> {
            Ok(Vec::new())
        }
    }

    fn message(pid: &str) -> Message {
        Message::parse(&format!("MSH|^~\\&|EPIC|MDA|||||ADT^A01|1|P|2.6\r{pid}")).unwrap()
    }

    fn known_patient() -> PatientIdentifierSet {
        PatientIdentifierSet::new(vec![
            IdentifierRecord::new("MRN123", "MRN"),
            IdentifierRecord::new("fhir12345", "FHIR STU3"),
        ])
    }

    #[test]
    fn test_collect_from_all_candidate_fields() {
        let m = message("PID|1|P1^^^MDA^PI|MRN123^^^MDA^MR~555^^^SSA^SS|ALT9^^^MDA^PN||||||||||||||ACC7^^^MDA^AN");
        let ids = PatientIdResolver::collect_identifiers(&m).unwrap();

        assert_eq!(ids.get("PI").map(String::as_str), Some("P1"));
        assert_eq!(ids.get("MR").map(String::as_str), Some("MRN123"));
        assert_eq!(ids.get("SS").map(String::as_str), Some("555"));
        assert_eq!(ids.get("PN").map(String::as_str), Some("ALT9"));
        assert_eq!(ids.get("AN").map(String::as_str), Some("ACC7"));
    }

    #[test]
    fn test_untyped_candidates_are_skipped() {
        let m = message("PID|1||MRN123~OTHER^^^MDA^MR");
        let ids = PatientIdResolver::collect_identifiers(&m).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("MR").map(String::as_str), Some("OTHER"));
    }

    #[test]
    fn test_duplicate_type_keeps_later_value() {
        let m = message("PID|1||FIRST^^^MDA^MR~SECOND^^^MDA^MR");
        let ids = PatientIdResolver::collect_identifiers(&m).unwrap();
        assert_eq!(ids.get("MR").map(String::as_str), Some("SECOND"));
    }

    #[tokio::test]
    async fn test_resolves_fhir_id_through_padded_mrn() {
        let identity = Arc::new(RecordingIdentity {
            response: Some(known_patient()),
            ..Default::default()
        });
        let resolver = PatientIdResolver::new(identity.clone());

        let fhir_id = resolver
            .resolve_fhir_id(&message("PID|1||MRN123^^^MDA^MR"))
            .await
            .unwrap();

        assert_eq!(fhir_id.as_ref().map(FhirId::as_str), Some("fhir12345"));
        assert_eq!(*identity.lookups.lock().unwrap(), vec!["MRN123".to_string()]);
    }

    #[tokio::test]
    async fn test_no_mrn_means_no_call() {
        let identity = Arc::new(RecordingIdentity::default());
        let resolver = PatientIdResolver::new(identity.clone());

        let result = resolver
            .resolve_fhir_id(&message("PID|1||555^^^SSA^SS"))
            .await
            .unwrap();

        assert_eq!(result, None);
        assert!(identity.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fhir_type_yields_none() {
        let identity = Arc::new(RecordingIdentity {
            response: Some(PatientIdentifierSet::new(vec![IdentifierRecord::new(
                "MRN123", "MRN",
            )])),
            ..Default::default()
        });
        let resolver = PatientIdResolver::new(identity);

        let result = resolver
            .resolve_fhir_id(&message("PID|1||MRN123^^^MDA^MR"))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_identity_errors_propagate() {
        let resolver = PatientIdResolver::new(Arc::new(RecordingIdentity::default()));

        let err = resolver
            .resolve_fhir_id(&message("PID|1||MRN123^^^MDA^MR"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::domain::TriageError::Identity(IdentityError::ResolutionFailed { status: 404, .. })
        ));
    }
}
