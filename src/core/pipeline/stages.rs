//! Stage 2 (identity) and stage 3 (records) workers
//!
//! Each stage pulls from a bounded queue and processes up to
//! `max_concurrency` items at once. Failures are logged per item and never
//! stop the stage.

use super::message::PipelineMessage;
use super::summary::{bump, PipelineStats};
use crate::adapters::sink::{RecordDelivery, RecordSink};
use crate::core::patient_id::PatientIdResolver;
use crate::core::records::RecordAggregator;
use crate::domain::TriageError;
use crate::{log_stage_failure, log_stage_halt};
use chrono::{NaiveDate, Utc};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Pulls items until the queue closes, then waits for in-flight work
pub(crate) async fn drain<F, Fut>(
    stage: &'static str,
    mut rx: mpsc::Receiver<PipelineMessage>,
    max_concurrency: usize,
    handle: F,
) where
    F: Fn(PipelineMessage) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let limit = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    while let Some(item) = rx.recv().await {
        let Ok(permit) = limit.clone().acquire_owned().await else {
            break;
        };
        let work = handle(item);
        tasks.spawn(async move {
            let _permit = permit;
            work.await;
        });

        while let Some(joined) = tasks.try_join_next() {
            report_join(stage, joined);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        report_join(stage, joined);
    }

    tracing::debug!(stage, "Stage drained");
}

fn report_join(stage: &'static str, joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(stage, error = %e, "Stage task panicked");
    }
}

/// Resolves the FHIR id and forwards to the record stage
pub(crate) async fn resolve_identity(
    mut item: PipelineMessage,
    resolver: PatientIdResolver,
    records_tx: mpsc::Sender<PipelineMessage>,
    stats: Arc<PipelineStats>,
) {
    let message_id = item.id();

    match resolver.resolve_fhir_id(item.message()).await {
        Ok(Some(fhir_id)) => {
            tracing::debug!(message_id = %message_id, fhir_id = %fhir_id, "Patient resolved");
            item.headers.insert_resolved_id(fhir_id);

            if records_tx.send(item).await.is_err() {
                bump(&stats.failed_identity);
                let error = TriageError::Pipeline("Record stage is no longer accepting messages".to_string());
                log_stage_failure!("identity", message_id, &error);
            } else {
                bump(&stats.queued_records);
            }
        }
        Ok(None) => {
            bump(&stats.halted_no_identity);
            log_stage_halt!("identity", message_id, "no FHIR STU3 id for patient");
        }
        Err(e) => {
            bump(&stats.failed_identity);
            log_stage_failure!("identity", message_id, &e);
        }
    }
}

/// Loads the patient's records and hands them to the sink
pub(crate) async fn aggregate_records(
    item: PipelineMessage,
    aggregator: RecordAggregator,
    sink: Arc<dyn RecordSink>,
    window_end: Option<NaiveDate>,
    stats: Arc<PipelineStats>,
) {
    let message_id = item.id();

    let (Some(tenant), Some(fhir_id)) = (item.headers.tenant(), item.headers.resolved_id().cloned())
    else {
        bump(&stats.failed_records);
        let error = TriageError::Pipeline("Message reached record stage without tenant or id".to_string());
        log_stage_failure!("records", message_id, &error);
        return;
    };

    let window = aggregator.window(window_end.unwrap_or_else(|| Utc::now().date_naive()));

    let resources = match aggregator.load_records(&fhir_id, window.end).await {
        Ok(resources) => resources,
        Err(e) => {
            bump(&stats.failed_records);
            log_stage_failure!("records", message_id, &e);
            return;
        }
    };
    bump(&stats.aggregated);

    let count = resources.len();
    let delivery = RecordDelivery {
        message_id,
        message_type: item.headers.message_type().unwrap_or_default().to_string(),
        tenant,
        fhir_id,
        window_start: window.start,
        window_end: window.end,
        resources,
    };

    match sink.submit(delivery).await {
        Ok(ack) => {
            bump(&stats.delivered);
            stats.resources_delivered.fetch_add(count, Ordering::Relaxed);
            tracing::info!(
                message_id = %message_id,
                tenant = %tenant,
                resources = count,
                accepted = ack.accepted,
                reference = ack.reference.as_deref().unwrap_or(""),
                "Records delivered"
            );
        }
        Err(e) => {
            bump(&stats.failed_delivery);
            log_stage_failure!("delivery", message_id, &e);
        }
    }
}
