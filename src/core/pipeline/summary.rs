//! Pipeline counters and the summary logged at shutdown

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Live counters shared by the router and stage workers
#[derive(Debug)]
pub struct PipelineStats {
    started: Instant,
    pub(crate) received: AtomicUsize,
    pub(crate) halted_no_tenant: AtomicUsize,
    pub(crate) queued_identity: AtomicUsize,
    pub(crate) halted_no_identity: AtomicUsize,
    pub(crate) queued_records: AtomicUsize,
    pub(crate) aggregated: AtomicUsize,
    pub(crate) delivered: AtomicUsize,
    pub(crate) resources_delivered: AtomicUsize,
    pub(crate) failed_routing: AtomicUsize,
    pub(crate) failed_identity: AtomicUsize,
    pub(crate) failed_records: AtomicUsize,
    pub(crate) failed_delivery: AtomicUsize,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            received: AtomicUsize::new(0),
            halted_no_tenant: AtomicUsize::new(0),
            queued_identity: AtomicUsize::new(0),
            halted_no_identity: AtomicUsize::new(0),
            queued_records: AtomicUsize::new(0),
            aggregated: AtomicUsize::new(0),
            delivered: AtomicUsize::new(0),
            resources_delivered: AtomicUsize::new(0),
            failed_routing: AtomicUsize::new(0),
            failed_identity: AtomicUsize::new(0),
            failed_records: AtomicUsize::new(0),
            failed_delivery: AtomicUsize::new(0),
        }
    }
}

pub(crate) fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PipelineStats {
    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> PipelineSummary {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        PipelineSummary {
            received: get(&self.received),
            halted_no_tenant: get(&self.halted_no_tenant),
            queued_identity: get(&self.queued_identity),
            halted_no_identity: get(&self.halted_no_identity),
            queued_records: get(&self.queued_records),
            aggregated: get(&self.aggregated),
            delivered: get(&self.delivered),
            resources_delivered: get(&self.resources_delivered),
            failed_routing: get(&self.failed_routing),
            failed_identity: get(&self.failed_identity),
            failed_records: get(&self.failed_records),
            failed_delivery: get(&self.failed_delivery),
            duration: self.started.elapsed(),
        }
    }
}

/// Counts of what happened to every ingested message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// Messages handed to the router
    pub received: usize,

    /// Stopped at stage 1 for lack of a tenant
    pub halted_no_tenant: usize,

    /// Handed to the identity stage
    pub queued_identity: usize,

    /// Stopped at stage 2 for lack of a resolved id
    pub halted_no_identity: usize,

    /// Handed to the record stage
    pub queued_records: usize,

    /// Record searches that completed
    pub aggregated: usize,

    /// Deliveries accepted by the sink
    pub delivered: usize,

    /// Resources across all accepted deliveries
    pub resources_delivered: usize,

    pub failed_routing: usize,
    pub failed_identity: usize,
    pub failed_records: usize,
    pub failed_delivery: usize,

    #[serde(skip)]
    pub duration: Duration,
}

impl PipelineSummary {
    pub fn failed(&self) -> usize {
        self.failed_routing + self.failed_identity + self.failed_records + self.failed_delivery
    }

    /// No item failed in any stage
    pub fn is_successful(&self) -> bool {
        self.failed() == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            received = self.received,
            halted_no_tenant = self.halted_no_tenant,
            halted_no_identity = self.halted_no_identity,
            aggregated = self.aggregated,
            delivered = self.delivered,
            resources = self.resources_delivered,
            failed = self.failed(),
            duration_secs = self.duration.as_secs(),
            "Pipeline drained"
        );

        if !self.is_successful() {
            tracing::warn!(
                routing = self.failed_routing,
                identity = self.failed_identity,
                records = self.failed_records,
                delivery = self.failed_delivery,
                "Pipeline completed with failures"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = PipelineStats::default();
        bump(&stats.received);
        bump(&stats.received);
        bump(&stats.failed_identity);

        let summary = stats.snapshot();
        assert_eq!(summary.received, 2);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_empty_summary_is_successful() {
        assert!(PipelineSummary::default().is_successful());
    }
}
