//! Record aggregation
//!
//! Loads the dependent records (encounters) of a resolved patient over a
//! lookback window ending at a given date.

use crate::adapters::identity::{IdentityResult, IdentityService};
use crate::domain::{FhirId, Resource};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;

/// Search window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Fetches and flattens paginated record searches
#[derive(Clone)]
pub struct RecordAggregator {
    identity: Arc<dyn IdentityService>,
    search_path: String,
    lookback_days: u32,
}

impl RecordAggregator {
    pub fn new(
        identity: Arc<dyn IdentityService>,
        search_path: impl Into<String>,
        lookback_days: u32,
    ) -> Self {
        Self {
            identity,
            search_path: search_path.into(),
            lookback_days,
        }
    }

    /// `[window_end - lookback, window_end]`
    pub fn window(&self, window_end: NaiveDate) -> SearchWindow {
        SearchWindow {
            start: window_end - Duration::days(i64::from(self.lookback_days)),
            end: window_end,
        }
    }

    /// Search path with `patient`, `date=ge…` and `date=le…` parameters
    pub fn search_path_for(&self, fhir_id: &FhirId, window: SearchWindow) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("patient", fhir_id.as_str())
            .append_pair("date", &format!("ge{}", window.start.format("%Y-%m-%d")))
            .append_pair("date", &format!("le{}", window.end.format("%Y-%m-%d")))
            .finish();

        let separator = if self.search_path.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.search_path, separator, query)
    }

    /// Loads every record for the patient in the window ending at `window_end`
    ///
    /// An empty result is not an error.
    pub async fn load_records(
        &self,
        fhir_id: &FhirId,
        window_end: NaiveDate,
    ) -> IdentityResult<Vec<Resource>> {
        let window = self.window(window_end);
        let path = self.search_path_for(fhir_id, window);

        tracing::debug!(
            fhir_id = %fhir_id,
            window_start = %window.start,
            window_end = %window.end,
            "Loading records"
        );

        self.identity.search_paged(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Mrn, PatientIdentifierSet};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct PathRecorder {
        paths: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IdentityService for PathRecorder {
        async fn lookup_identifiers_by_mrn(&self, _mrn: &Mrn) -> IdentityResult<PatientIdentifierSet> {
            Ok(PatientIdentifierSet::default())
        }

        async fn search_paged(&self, initial_path: &str) -> IdentityResult<Vec<Resource>> {
            self.paths.lock().unwrap().push(initial_path.to_string());
            Ok(vec![Resource::new(json!({ "id": "1366573" }))])
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_day_window() {
        let aggregator = RecordAggregator::new(Arc::new(PathRecorder::default()), "api/FHIR/STU3/Encounter", 7);
        let window = aggregator.window(date(2021, 7, 8));
        assert_eq!(window.start, date(2021, 7, 1));
        assert_eq!(window.end, date(2021, 7, 8));
    }

    #[test]
    fn test_window_crosses_month_boundary() {
        let aggregator = RecordAggregator::new(Arc::new(PathRecorder::default()), "x", 7);
        assert_eq!(aggregator.window(date(2021, 3, 3)).start, date(2021, 2, 24));
    }

    #[test]
    fn test_search_path_is_encoded() {
        let aggregator = RecordAggregator::new(Arc::new(PathRecorder::default()), "api/FHIR/STU3/Encounter", 7);
        let fhir_id = FhirId::new("abc def&x").unwrap();
        let path = aggregator.search_path_for(&fhir_id, aggregator.window(date(2021, 7, 8)));

        assert_eq!(
            path,
            "api/FHIR/STU3/Encounter?patient=abc+def%26x&date=ge2021-07-01&date=le2021-07-08"
        );
    }

    #[test]
    fn test_existing_query_is_extended() {
        let aggregator = RecordAggregator::new(Arc::new(PathRecorder::default()), "Encounter?_count=50", 7);
        let fhir_id = FhirId::new("fhir12345").unwrap();
        let path = aggregator.search_path_for(&fhir_id, aggregator.window(date(2021, 7, 8)));
        assert!(path.starts_with("Encounter?_count=50&patient=fhir12345"));
    }

    #[tokio::test]
    async fn test_load_records_delegates_to_search() {
        let recorder = Arc::new(PathRecorder::default());
        let aggregator = RecordAggregator::new(recorder.clone(), "api/FHIR/STU3/Encounter", 7);

        let records = aggregator
            .load_records(&FhirId::new("fhir12345").unwrap(), date(2021, 7, 8))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            recorder.paths.lock().unwrap().as_slice(),
            ["api/FHIR/STU3/Encounter?patient=fhir12345&date=ge2021-07-01&date=le2021-07-08"]
        );
    }
}
