use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::poller::PollSource;
use crate::reconciler::Reconciliation;

/// Per-source poll counters
#[derive(Debug, Default)]
struct SourceCounters {
    ticks_started: AtomicU64,
    ticks_skipped: AtomicU64,
    fetch_failures: AtomicU64,
    patched: AtomicU64,
    rebuilt: AtomicU64,
    replaced: AtomicU64,
}

/// Poll and reconciliation counters for every source
#[derive(Debug, Default)]
pub struct PollMetrics {
    sources: [SourceCounters; PollSource::COUNT],
}

impl PollMetrics {
    fn counters(&self, source: PollSource) -> &SourceCounters {
        &self.sources[source.index()]
    }

    pub fn record_tick_started(&self, source: PollSource) {
        self.counters(source)
            .ticks_started
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_skipped(&self, source: PollSource) {
        self.counters(source)
            .ticks_skipped
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self, source: PollSource) {
        self.counters(source)
            .fetch_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconciliation(&self, source: PollSource, outcome: Reconciliation) {
        let counters = self.counters(source);
        let counter = match outcome {
            Reconciliation::Patched { .. } => &counters.patched,
            Reconciliation::Rebuilt => &counters.rebuilt,
            Reconciliation::Replaced => &counters.replaced,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn source_snapshot(&self, source: PollSource) -> SourceMetricsSnapshot {
        let counters = self.counters(source);
        SourceMetricsSnapshot {
            source,
            ticks_started: counters.ticks_started.load(Ordering::Relaxed),
            ticks_skipped: counters.ticks_skipped.load(Ordering::Relaxed),
            fetch_failures: counters.fetch_failures.load(Ordering::Relaxed),
            patched: counters.patched.load(Ordering::Relaxed),
            rebuilt: counters.rebuilt.load(Ordering::Relaxed),
            replaced: counters.replaced.load(Ordering::Relaxed),
        }
    }

    pub fn snapshot(&self) -> Vec<SourceMetricsSnapshot> {
        PollSource::ALL
            .iter()
            .map(|source| self.source_snapshot(*source))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetricsSnapshot {
    pub source: PollSource,
    pub ticks_started: u64,
    pub ticks_skipped: u64,
    pub fetch_failures: u64,
    pub patched: u64,
    pub rebuilt: u64,
    pub replaced: u64,
}

impl SourceMetricsSnapshot {
    /// Number of times the source's snapshot was reconciled
    pub fn reconciliations(&self) -> u64 {
        self.patched + self.rebuilt + self.replaced
    }
}
