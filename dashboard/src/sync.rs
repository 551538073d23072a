//! Source sync tasks: fetch one source and fold it into [`AppState`]
//!
//! A failed fetch returns before the write lock is taken, so the prior
//! snapshot and everything rendered from it stay exactly as they were.

use async_trait::async_trait;
use icsi_node_api::NodeClient;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::entity::{BegSession, DiscoveryState};
use crate::poller::{PollSource, PollTarget, TickOutcome};
use crate::reconciler::Reconciliation;
use crate::state::{SharedState, UiEvent};

pub struct SourceSync {
    source: PollSource,
    client: NodeClient,
    state: SharedState,
    events: broadcast::Sender<UiEvent>,
}

impl SourceSync {
    pub fn new(
        source: PollSource,
        client: NodeClient,
        state: SharedState,
        events: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            source,
            client,
            state,
            events,
        }
    }

    async fn fetch_and_apply(&self) -> Option<Reconciliation> {
        match self.source {
            PollSource::Peers => {
                let response = self.client.peers().await.fresh()?;
                let mut state = self.state.write().await;
                state.height = Some(response.height);
                let outcome = state.peers.reconcile(response.peers);
                log_rebuild(self.source, outcome, state.peers.generation());
                Some(outcome)
            }
            PollSource::Miner => {
                let status = self.client.miner_status().await.fresh()?;
                self.state.write().await.miner = Some(status);
                Some(Reconciliation::Replaced)
            }
            PollSource::Stats => {
                let stats = self.client.stats().await.fresh()?;
                self.state.write().await.stats = Some(stats);
                Some(Reconciliation::Replaced)
            }
            PollSource::Wallets => {
                let response = self.client.wallets().await.fresh()?;
                let mut state = self.state.write().await;
                let outcome = state.wallets.reconcile(response.wallets);
                log_rebuild(self.source, outcome, state.wallets.snapshot().generation());
                Some(outcome)
            }
            PollSource::Discovery => {
                let status = self.client.discovery().await.fresh()?;
                let mut state = self.state.write().await;
                state.discovery = DiscoveryState::from_status(&status);
                if state.seed.apply_discovery(&status) {
                    tracing::debug!(seed = %state.seed.value(), "Seed field auto-filled");
                }
                state.own_ip = status.own_ip;
                Some(Reconciliation::Replaced)
            }
            PollSource::Beggars => {
                let response = self.client.beggar_list().await.fresh()?;
                let mut state = self.state.write().await;
                state.beg = BegSession::from_poll(response.active_beg);
                let outcome = state.beggars.reconcile(response.beggars);
                log_rebuild(self.source, outcome, state.beggars.generation());
                Some(outcome)
            }
        }
    }
}

/// Row order or membership changed: the apply step redraws the whole table
fn log_rebuild(source: PollSource, outcome: Reconciliation, generation: u64) {
    if outcome.is_rebuild() {
        tracing::debug!(source = %source, generation, "Snapshot rebuilt");
    }
}

#[async_trait]
impl PollTarget for SourceSync {
    fn source(&self) -> PollSource {
        self.source
    }

    #[instrument(skip(self), fields(source = %self.source))]
    async fn tick(&self) -> TickOutcome {
        match self.fetch_and_apply().await {
            Some(reconciliation) => {
                tracing::trace!(?reconciliation, "Snapshot reconciled");
                // No receivers just means nothing is rendering yet
                let _ = self.events.send(UiEvent::Snapshot(self.source));
                TickOutcome::Applied(reconciliation)
            }
            None => TickOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use icsi_node_api::constants::{PATH_DISCOVERY, PATH_PEERS};
    use std::time::Duration;

    async fn sync_for(
        server: &mockito::Server,
        source: PollSource,
    ) -> (SourceSync, SharedState, broadcast::Receiver<UiEvent>) {
        let client = NodeClient::new(&server.url(), Duration::from_secs(2)).unwrap();
        let state = AppState::shared();
        let (events, receiver) = crate::state::event_channel();
        (
            SourceSync::new(source, client, state.clone(), events),
            state,
            receiver,
        )
    }

    #[tokio::test]
    async fn test_peer_tick_reconciles_and_signals() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH_PEERS)
            .with_status(200)
            .with_body(r#"{"peers": [{"ip": "10.0.0.2", "port": 9341, "status": "ACTIVE"}], "height": 42}"#)
            .create_async()
            .await;
        let (sync, state, mut events) = sync_for(&server, PollSource::Peers).await;

        assert_eq!(sync.tick().await, TickOutcome::Applied(Reconciliation::Rebuilt));
        assert_eq!(events.try_recv().unwrap(), UiEvent::Snapshot(PollSource::Peers));

        let state = state.read().await;
        assert_eq!(state.height, Some(42));
        assert_eq!(state.peers.len(), 1);
        assert_eq!(state.peers.generation(), 1);
    }

    #[tokio::test]
    async fn test_failed_tick_keeps_snapshot_and_stays_silent() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("GET", PATH_PEERS)
            .with_status(200)
            .with_body(r#"{"peers": [{"ip": "10.0.0.2", "port": 9341, "status": "ACTIVE"}], "height": 7}"#)
            .create_async()
            .await;
        let (sync, state, mut events) = sync_for(&server, PollSource::Peers).await;
        sync.tick().await;
        events.try_recv().unwrap();

        ok.remove_async().await;
        let _failing = server
            .mock("GET", PATH_PEERS)
            .with_status(500)
            .create_async()
            .await;

        assert_eq!(sync.tick().await, TickOutcome::Failed);
        assert!(events.try_recv().is_err());

        let state = state.read().await;
        assert_eq!(state.height, Some(7));
        assert_eq!(state.peers.items()[0].ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_discovery_tick_fills_seed_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH_DISCOVERY)
            .with_status(200)
            .with_body(r#"{"discovered_seed": "203.0.113.7", "own_ip": "198.51.100.2"}"#)
            .create_async()
            .await;
        let (sync, state, _events) = sync_for(&server, PollSource::Discovery).await;

        assert_eq!(sync.tick().await, TickOutcome::Applied(Reconciliation::Replaced));

        let state = state.read().await;
        assert_eq!(state.seed.value(), "203.0.113.7");
        assert_eq!(state.own_ip.as_deref(), Some("198.51.100.2"));
        assert_eq!(
            state.discovery,
            DiscoveryState::SeedDiscovered("203.0.113.7".to_string())
        );
    }
}
