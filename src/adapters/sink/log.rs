use super::{RecordDelivery, RecordSink, SinkAck};
use crate::domain::Result;
use async_trait::async_trait;

/// Sink that only logs what it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl RecordSink for LogSink {
    async fn submit(&self, delivery: RecordDelivery) -> Result<SinkAck> {
        let ids: Vec<&str> = delivery.resources.iter().filter_map(|r| r.id()).collect();

        tracing::info!(
            message_id = %delivery.message_id,
            message_type = %delivery.message_type,
            tenant = %delivery.tenant,
            fhir_id = %delivery.fhir_id,
            window_start = %delivery.window_start,
            window_end = %delivery.window_end,
            count = delivery.resources.len(),
            resource_ids = ?ids,
            "Records aggregated"
        );

        for resource in &delivery.resources {
            tracing::debug!(
                message_id = %delivery.message_id,
                resource_type = resource.resource_type().unwrap_or("unknown"),
                resource_id = resource.id().unwrap_or_default(),
                occurred_at = resource.period_start().unwrap_or_default(),
                "Record occurred"
            );
        }

        Ok(SinkAck {
            accepted: delivery.resources.len(),
            reference: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FhirId, Resource, TenantId};
    use chrono::NaiveDate;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let delivery = RecordDelivery {
            message_id: Uuid::new_v4(),
            message_type: "ADT^A01".to_string(),
            tenant: TenantId::new(1002),
            fhir_id: FhirId::new("fhir12345").unwrap(),
            window_start: NaiveDate::from_ymd_opt(2021, 7, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2021, 7, 8).unwrap(),
            resources: vec![
                Resource::new(json!({
                    "resourceType": "Encounter",
                    "id": "1366573",
                    "period": { "start": "2021-07-03T11:56:23.000Z" }
                })),
                Resource::new(json!({ "id": "1366488" })),
            ],
        };

        let ack = LogSink.submit(delivery).await.unwrap();
        assert_eq!(ack.accepted, 2);
        assert_eq!(ack.reference, None);
    }
}
