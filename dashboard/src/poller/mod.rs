//! Periodic polling of node sources
//!
//! Every source gets its own timer task. A timer tick never waits for the
//! previous tick of the same source: it spawns the tick and moves on. The
//! per-source overlap guard then decides whether the spawned tick runs or is
//! skipped, so a slow node results in skipped ticks rather than a queue.
//!
//! Sources never block each other. Out-of-band polls requested after a user
//! action go through the same guard as timer ticks.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::metrics::PollMetrics;
use crate::reconciler::Reconciliation;

/// Independently polled node endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollSource {
    Peers,
    Miner,
    Stats,
    Wallets,
    Discovery,
    Beggars,
}

impl PollSource {
    pub const COUNT: usize = 6;

    pub const ALL: [PollSource; PollSource::COUNT] = [
        PollSource::Peers,
        PollSource::Miner,
        PollSource::Stats,
        PollSource::Wallets,
        PollSource::Discovery,
        PollSource::Beggars,
    ];

    pub fn index(self) -> usize {
        match self {
            PollSource::Peers => 0,
            PollSource::Miner => 1,
            PollSource::Stats => 2,
            PollSource::Wallets => 3,
            PollSource::Discovery => 4,
            PollSource::Beggars => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PollSource::Peers => "peers",
            PollSource::Miner => "miner",
            PollSource::Stats => "stats",
            PollSource::Wallets => "wallets",
            PollSource::Discovery => "discovery",
            PollSource::Beggars => "beggars",
        }
    }
}

impl fmt::Display for PollSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timer of a source. Only the beggar registry uses the elevated lane
/// (while its view is open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Baseline,
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub source: PollSource,
    pub lane: Lane,
}

impl TimerKey {
    pub fn baseline(source: PollSource) -> Self {
        Self {
            source,
            lane: Lane::Baseline,
        }
    }

    pub fn elevated(source: PollSource) -> Self {
        Self {
            source,
            lane: Lane::Elevated,
        }
    }
}

/// Result of a single fetch + reconcile cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Applied(Reconciliation),
    /// Fetch failed; prior snapshot left untouched
    Failed,
}

/// Result of asking a source to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    Completed(TickOutcome),
    /// Previous tick of the same source still running
    Skipped,
}

/// One pollable source: fetch, reconcile into state, signal a render
#[async_trait]
pub trait PollTarget: Send + Sync {
    fn source(&self) -> PollSource;

    async fn tick(&self) -> TickOutcome;
}

/// A poll target wrapped with its overlap guard
#[derive(Clone)]
pub struct SourceTask {
    target: Arc<dyn PollTarget>,
    guard: Arc<Mutex<()>>,
    metrics: Arc<PollMetrics>,
}

impl SourceTask {
    pub fn new(target: Arc<dyn PollTarget>, metrics: Arc<PollMetrics>) -> Self {
        Self {
            target,
            guard: Arc::new(Mutex::new(())),
            metrics,
        }
    }

    pub fn source(&self) -> PollSource {
        self.target.source()
    }

    /// Run one tick unless one is already in flight for this source
    pub async fn poll_now(&self) -> PollResult {
        let source = self.source();

        let Ok(_permit) = self.guard.clone().try_lock_owned() else {
            self.metrics.record_tick_skipped(source);
            tracing::debug!(source = %source, "Tick skipped, previous tick still running");
            return PollResult::Skipped;
        };

        self.metrics.record_tick_started(source);
        let outcome = self.target.tick().await;
        match outcome {
            TickOutcome::Applied(reconciliation) => {
                self.metrics.record_reconciliation(source, reconciliation);
            }
            TickOutcome::Failed => self.metrics.record_fetch_failure(source),
        }

        PollResult::Completed(outcome)
    }
}

/// Owns the source tasks and their running timers
pub struct Poller {
    tasks: HashMap<PollSource, SourceTask>,
    timers: Mutex<HashMap<TimerKey, JoinHandle<()>>>,
    metrics: Arc<PollMetrics>,
}

impl Poller {
    pub fn new(metrics: Arc<PollMetrics>) -> Self {
        Self {
            tasks: HashMap::new(),
            timers: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Register a target. Registering a source twice replaces the earlier target.
    pub fn register(&mut self, target: Arc<dyn PollTarget>) {
        let task = SourceTask::new(target, self.metrics.clone());
        self.tasks.insert(task.source(), task);
    }

    pub fn metrics(&self) -> &Arc<PollMetrics> {
        &self.metrics
    }

    /// Start a timer. The first tick fires immediately.
    ///
    /// Returns false when the source is unknown or the timer already runs.
    pub async fn start(&self, key: TimerKey, period: Duration) -> bool {
        let Some(task) = self.tasks.get(&key.source).cloned() else {
            tracing::warn!(source = %key.source, "No poll target registered");
            return false;
        };

        let mut timers = self.timers.lock().await;
        if timers.contains_key(&key) {
            return false;
        }

        tracing::info!(
            source = %key.source,
            lane = ?key.lane,
            period_ms = period.as_millis() as u64,
            "Starting poll timer"
        );
        let handle = tokio::spawn(timer_loop(task, period));
        timers.insert(key, handle);
        true
    }

    /// Stop exactly one timer. In-flight ticks are allowed to finish.
    pub async fn stop(&self, key: TimerKey) -> bool {
        let mut timers = self.timers.lock().await;
        match timers.remove(&key) {
            Some(handle) => {
                handle.abort();
                tracing::info!(source = %key.source, lane = ?key.lane, "Stopped poll timer");
                true
            }
            None => false,
        }
    }

    pub async fn stop_all(&self) {
        let mut timers = self.timers.lock().await;
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }

    pub async fn is_running(&self, key: TimerKey) -> bool {
        self.timers.lock().await.contains_key(&key)
    }

    /// Out-of-band poll, subject to the same overlap guard as timer ticks
    pub async fn poll_now(&self, source: PollSource) -> Option<PollResult> {
        let task = self.tasks.get(&source)?;
        Some(task.poll_now().await)
    }
}

async fn timer_loop(task: SourceTask, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let task = task.clone();
        tokio::spawn(async move {
            task.poll_now().await;
        });
    }
}
