//! Tests for Poller
//!
//! Verifies the overlap guard, immediate first tick and per-timer stop.

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Target whose tick takes `delay` and records peak concurrency
struct SlowTarget {
    source: PollSource,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl SlowTarget {
    fn new(source: PollSource, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            source,
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PollTarget for SlowTarget {
    fn source(&self) -> PollSource {
        self.source
    }

    async fn tick(&self) -> TickOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        TickOutcome::Applied(Reconciliation::Rebuilt)
    }
}

struct FailingTarget;

#[async_trait]
impl PollTarget for FailingTarget {
    fn source(&self) -> PollSource {
        PollSource::Stats
    }

    async fn tick(&self) -> TickOutcome {
        TickOutcome::Failed
    }
}

fn poller_with(targets: Vec<Arc<dyn PollTarget>>) -> Poller {
    let mut poller = Poller::new(Arc::new(PollMetrics::default()));
    for target in targets {
        poller.register(target);
    }
    poller
}

#[test]
fn test_poll_source_indices_are_dense() {
    for (i, source) in PollSource::ALL.iter().enumerate() {
        assert_eq!(source.index(), i);
    }
    assert_eq!(PollSource::Wallets.to_string(), "wallets");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_poll_now_is_skipped() {
    let target = SlowTarget::new(PollSource::Wallets, Duration::from_millis(500));
    let poller = poller_with(vec![target.clone() as Arc<dyn PollTarget>]);

    let (first, second) = tokio::join!(
        poller.poll_now(PollSource::Wallets),
        poller.poll_now(PollSource::Wallets)
    );

    assert_eq!(
        first,
        Some(PollResult::Completed(TickOutcome::Applied(Reconciliation::Rebuilt)))
    );
    assert_eq!(second, Some(PollResult::Skipped));
    assert_eq!(target.completed.load(Ordering::SeqCst), 1);

    let snapshot = poller.metrics().source_snapshot(PollSource::Wallets);
    assert_eq!(snapshot.ticks_started, 1);
    assert_eq!(snapshot.ticks_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetch_skips_overlapping_ticks() {
    // Period 1000ms, each fetch takes 2500ms.
    // Ticks at 0, 1000, 2000, 3000, 4000: tick 0 runs until 2500,
    // tick 3000 runs until 5500, every other tick is skipped.
    let target = SlowTarget::new(PollSource::Wallets, Duration::from_millis(2500));
    let poller = poller_with(vec![target.clone() as Arc<dyn PollTarget>]);

    assert!(
        poller
            .start(TimerKey::baseline(PollSource::Wallets), Duration::from_millis(1000))
            .await
    );
    tokio::time::sleep(Duration::from_millis(4600)).await;

    assert_eq!(target.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(target.completed.load(Ordering::SeqCst), 1);

    let snapshot = poller.metrics().source_snapshot(PollSource::Wallets);
    assert_eq!(snapshot.ticks_started, 2);
    assert_eq!(snapshot.ticks_skipped, 3);
    assert_eq!(snapshot.reconciliations(), 1);

    poller.stop_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_immediately() {
    let target = SlowTarget::new(PollSource::Peers, Duration::from_millis(1));
    let poller = poller_with(vec![target.clone() as Arc<dyn PollTarget>]);

    poller
        .start(TimerKey::baseline(PollSource::Peers), Duration::from_secs(60))
        .await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(target.completed.load(Ordering::SeqCst), 1);
    poller.stop_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_elevated_lane_keeps_baseline_running() {
    let target = SlowTarget::new(PollSource::Beggars, Duration::from_millis(1));
    let poller = poller_with(vec![target.clone() as Arc<dyn PollTarget>]);

    let baseline = TimerKey::baseline(PollSource::Beggars);
    let elevated = TimerKey::elevated(PollSource::Beggars);
    assert!(poller.start(baseline, Duration::from_millis(1000)).await);
    assert!(poller.start(elevated, Duration::from_millis(1000)).await);
    // Second start of the same timer is refused
    assert!(!poller.start(elevated, Duration::from_millis(1000)).await);

    assert!(poller.stop(elevated).await);
    assert!(!poller.stop(elevated).await);
    assert!(poller.is_running(baseline).await);
    assert!(!poller.is_running(elevated).await);

    // Baseline ticks at 0, 1000, 2000 and 3000
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(target.completed.load(Ordering::SeqCst), 4);

    poller.stop_all().await;
}

#[tokio::test(start_paused = true)]
async fn test_stopped_timer_no_longer_ticks() {
    let target = SlowTarget::new(PollSource::Miner, Duration::from_millis(1));
    let poller = poller_with(vec![target.clone() as Arc<dyn PollTarget>]);
    let key = TimerKey::baseline(PollSource::Miner);

    poller.start(key, Duration::from_millis(1000)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    poller.stop(key).await;

    let before = target.completed.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(target.completed.load(Ordering::SeqCst), before);
}

#[tokio::test]
async fn test_failed_tick_counts_failure() {
    let poller = poller_with(vec![Arc::new(FailingTarget) as Arc<dyn PollTarget>]);

    let result = poller.poll_now(PollSource::Stats).await;
    assert_eq!(result, Some(PollResult::Completed(TickOutcome::Failed)));

    let snapshot = poller.metrics().source_snapshot(PollSource::Stats);
    assert_eq!(snapshot.fetch_failures, 1);
    assert_eq!(snapshot.reconciliations(), 0);
}

#[tokio::test]
async fn test_unregistered_source() {
    let poller = poller_with(vec![]);
    assert_eq!(poller.poll_now(PollSource::Peers).await, None);
    assert!(
        !poller
            .start(TimerKey::baseline(PollSource::Peers), Duration::from_millis(100))
            .await
    );
}
