//! The three-stage admission pipeline
//!
//! ```text
//!  Router::ingest ──► [identity queue] ──► identity stage ──► [record queue] ──► record stage ──► sink
//!   (stage 1)                               (stage 2)                            (stage 3)
//! ```
//!
//! Stage 1 runs inline and returns the acknowledgment. Stages 2 and 3 are
//! background workers fed by bounded queues; a full queue makes the caller
//! wait. Dropping every [`Router`] closes the identity queue, after which
//! [`Pipeline::shutdown`] drains both stages in order.

pub mod message;
pub mod router;
mod stages;
pub mod summary;

pub use message::{Headers, PipelineMessage};
pub use router::{IngestOutcome, Router};
pub use summary::{PipelineStats, PipelineSummary};

use crate::adapters::identity::{IdentityClient, IdentityService};
use crate::adapters::sink::{self, RecordSink};
use crate::config::{PipelineConfig, TriageConfig};
use crate::core::patient_id::PatientIdResolver;
use crate::core::records::RecordAggregator;
use crate::core::tenant::{TenantDirectory, TenantResolver};
use crate::domain::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Collaborators used by the stages
#[derive(Clone)]
pub struct PipelineServices {
    pub tenants: TenantResolver,
    pub patients: PatientIdResolver,
    pub records: RecordAggregator,
    pub sink: Arc<dyn RecordSink>,
}

impl PipelineServices {
    /// Wires the identity client, tenant table and sink from configuration
    ///
    /// One identity client is shared by stages 2 and 3 so the bearer
    /// credential is fetched once.
    pub fn from_config(config: &TriageConfig) -> Result<Self> {
        let identity: Arc<dyn IdentityService> = Arc::new(IdentityClient::new(&config.identity)?);
        let directory = TenantDirectory::from_config(&config.tenants);

        tracing::info!(
            tenants = directory.len(),
            sink = ?config.sink.kind,
            "Pipeline services configured"
        );

        Ok(Self {
            tenants: TenantResolver::new(Arc::new(directory)),
            patients: PatientIdResolver::new(identity.clone()),
            records: RecordAggregator::new(
                identity,
                config.identity.encounter_search_path.clone(),
                config.pipeline.lookback_days,
            ),
            sink: sink::from_config(&config.sink)?,
        })
    }
}

/// Handle on the running stage workers
pub struct Pipeline {
    identity_worker: JoinHandle<()>,
    records_worker: JoinHandle<()>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Spawns stages 2 and 3 and returns the stage 1 entry point
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(services: PipelineServices, config: &PipelineConfig) -> (Self, Router) {
        let stats = Arc::new(PipelineStats::default());
        let capacity = config.queue_capacity.max(1);
        let (identity_tx, identity_rx) = mpsc::channel(capacity);
        let (records_tx, records_rx) = mpsc::channel(capacity);

        let identity_worker = {
            let resolver = services.patients.clone();
            let stats = stats.clone();
            tokio::spawn(stages::drain(
                "identity",
                identity_rx,
                config.max_concurrency,
                move |item| {
                    stages::resolve_identity(item, resolver.clone(), records_tx.clone(), stats.clone())
                },
            ))
        };

        let records_worker = {
            let aggregator = services.records.clone();
            let sink = services.sink.clone();
            let window_end = config.window_end;
            let stats = stats.clone();
            tokio::spawn(stages::drain(
                "records",
                records_rx,
                config.max_concurrency,
                move |item| {
                    stages::aggregate_records(
                        item,
                        aggregator.clone(),
                        sink.clone(),
                        window_end,
                        stats.clone(),
                    )
                },
            ))
        };

        tracing::info!(
            queue_capacity = capacity,
            max_concurrency = config.max_concurrency,
            lookback_days = config.lookback_days,
            "Pipeline started"
        );

        let router = Router::new(services.tenants, identity_tx, stats.clone());
        (
            Self {
                identity_worker,
                records_worker,
                stats,
            },
            router,
        )
    }

    /// Current counters
    pub fn stats(&self) -> PipelineSummary {
        self.stats.snapshot()
    }

    /// Waits for both stages to drain
    ///
    /// Completes only after every [`Router`] clone has been dropped.
    pub async fn shutdown(self) -> PipelineSummary {
        if let Err(e) = self.identity_worker.await {
            tracing::error!(error = %e, "Identity stage worker failed");
        }
        if let Err(e) = self.records_worker.await {
            tracing::error!(error = %e, "Record stage worker failed");
        }

        let summary = self.stats.snapshot();
        summary.log_summary();
        summary
    }
}
