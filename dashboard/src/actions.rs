//! User actions and the dashboard facade
//!
//! `Dashboard` wires the client, shared state, poller and render channel
//! together. Every action:
//! 1. validates input and updates entity state synchronously
//! 2. performs one node request
//! 3. records the outcome as an inline notice
//! 4. optionally requests an out-of-band poll of the affected source

use std::sync::Arc;

use icsi_node_api::{
    ConnectRequest, FetchError, NatTestRequest, NodeClient, PeerKey, PeerKeyError, RpcConfig,
    SendRequest,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::config::Config;
use crate::entity::{AttemptError, ConnectVerdict, ATTEMPT_DECAY};
use crate::metrics::{PollMetrics, SourceMetricsSnapshot};
use crate::poller::{PollSource, Poller, TimerKey};
use crate::state::{AppState, Notice, NoticeSlot, PeerLogs, SharedState, UiEvent};
use crate::sync::SourceSync;
use crate::view::{render, DashboardView, RenderOptions};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid peer address: {0}")]
    InvalidPeer(#[from] PeerKeyError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),

    #[error("no wallet selected")]
    NoWalletSelected,

    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl ActionError {
    /// Text for the inline notice: the node's own message when it sent one
    fn notice_text(&self) -> String {
        match self {
            ActionError::Fetch(e) => e
                .node_message()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
            other => other.to_string(),
        }
    }
}

pub struct Dashboard {
    client: NodeClient,
    state: SharedState,
    events: broadcast::Sender<UiEvent>,
    poller: Arc<Poller>,
    config: Config,
}

impl Dashboard {
    pub fn new(config: Config) -> Result<Self, ActionError> {
        let client = NodeClient::new(&config.node.base_url, config.node.request_timeout())?;
        let state = AppState::shared();
        let (events, _) = crate::state::event_channel();

        let mut poller = Poller::new(Arc::new(PollMetrics::default()));
        for source in PollSource::ALL {
            poller.register(Arc::new(SourceSync::new(
                source,
                client.clone(),
                state.clone(),
                events.clone(),
            )));
        }

        Ok(Self {
            client,
            state,
            events,
            poller: Arc::new(poller),
            config,
        })
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::from(&self.config.ui)
    }

    /// Start the baseline timer of every source
    pub async fn start(&self) {
        for source in PollSource::ALL {
            self.poller
                .start(
                    TimerKey::baseline(source),
                    self.config.polling.interval_for(source),
                )
                .await;
        }
    }

    pub async fn shutdown(&self) {
        self.poller.stop_all().await;
    }

    pub async fn render(&self) -> DashboardView {
        let now = chrono::Utc::now().timestamp();
        let state = self.state.read().await;
        render(&state, now, &self.render_options())
    }

    pub fn metrics(&self) -> Vec<SourceMetricsSnapshot> {
        self.poller.metrics().snapshot()
    }

    /// Poll one source now, through its overlap guard
    pub async fn refresh(&self, source: PollSource) {
        self.poller.poll_now(source).await;
    }

    /// Fire-and-forget refresh after an action
    fn refresh_in_background(&self, source: PollSource) {
        let poller = self.poller.clone();
        tokio::spawn(async move {
            poller.poll_now(source).await;
        });
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }

    async fn notify(&self, slot: NoticeSlot, notice: Notice) {
        self.state.write().await.set_notice(slot, notice);
        self.emit(UiEvent::Notice(slot));
    }

    async fn notify_failure(&self, slot: NoticeSlot, error: &ActionError) {
        tracing::warn!(slot = ?slot, error = %error, "Action failed");
        self.notify(slot, Notice::error(format!("FAILED: {}", error.notice_text())))
            .await;
    }

    /// Record a failed result as a notice and hand it back
    async fn report<T>(
        &self,
        slot: NoticeSlot,
        result: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        if let Err(error) = &result {
            self.notify_failure(slot, error).await;
        }
        result
    }

    async fn selected_wallet(&self) -> Result<String, ActionError> {
        self.state
            .read()
            .await
            .wallets
            .selected_address()
            .map(str::to_string)
            .ok_or(ActionError::NoWalletSelected)
    }

    // =========================================================================
    // Local input
    // =========================================================================

    pub async fn set_seed(&self, value: &str) {
        self.state.write().await.seed.set_by_user(value);
        self.emit(UiEvent::Input);
    }

    pub async fn set_filter(&self, value: &str) {
        self.state.write().await.peer_filter = value.trim().to_string();
        self.emit(UiEvent::Input);
    }

    pub async fn select_wallet(&self, address: &str) -> Result<(), ActionError> {
        if !self.state.write().await.wallets.select(address) {
            return Err(ActionError::UnknownWallet(address.to_string()));
        }
        self.emit(UiEvent::Input);
        Ok(())
    }

    // =========================================================================
    // Network
    // =========================================================================

    /// Connect to `target`, or to the seed field when no target is given
    ///
    /// The attempt moves to Pending before the request is sent and decays back
    /// to Idle [`ATTEMPT_DECAY`] after it finishes, whatever the outcome.
    #[instrument(skip(self))]
    pub async fn connect(&self, target: Option<&str>) -> Result<ConnectVerdict, ActionError> {
        let begun = self.begin_attempt(target).await;
        let (key, generation) = self.report(NoticeSlot::Connect, begun).await?;
        self.emit(UiEvent::Attempt(key.clone()));

        let request = ConnectRequest {
            seed_ip: key.to_string(),
            force: None,
            wait: None,
        };
        let result = self.client.connect(&request).await;

        let outcome = result
            .map(|response| ConnectVerdict::interpret(&key, &response))
            .map_err(ActionError::from);
        let success = matches!(&outcome, Ok(verdict) if verdict.is_success());

        self.state
            .write()
            .await
            .attempts
            .finish(&key, generation, success);
        self.emit(UiEvent::Attempt(key.clone()));
        self.schedule_attempt_decay(key.clone(), generation);

        match &outcome {
            Ok(verdict) => {
                tracing::info!(peer = %key, verdict = ?verdict, "Connect finished");
                let notice = match verdict {
                    ConnectVerdict::Explicit { success: true } => {
                        Notice::info(format!("CONNECTED: {}", key))
                    }
                    ConnectVerdict::ImplicitFromCount { connected_count } => {
                        Notice::info(format!("INITIATED ({})", connected_count))
                    }
                    _ => Notice::error(format!("FAILED: no connection to {}", key)),
                };
                self.notify(NoticeSlot::Connect, notice).await;
                self.refresh_in_background(PollSource::Peers);
            }
            Err(e) => self.notify_failure(NoticeSlot::Connect, e).await,
        }

        outcome
    }

    /// Idle → Pending for the target (or seed field) peer
    async fn begin_attempt(&self, target: Option<&str>) -> Result<(PeerKey, u64), ActionError> {
        let mut state = self.state.write().await;
        if let Some(target) = target {
            state.seed.set_by_user(target);
        }
        let key =
            PeerKey::parse_with_default(state.seed.value(), self.config.ui.default_peer_port)?;
        let generation = state.attempts.begin(&key)?;
        Ok((key, generation))
    }

    fn schedule_attempt_decay(&self, key: PeerKey, generation: u64) {
        let state = self.state.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ATTEMPT_DECAY).await;
            if state.write().await.attempts.expire(&key, generation) {
                let _ = events.send(UiEvent::Attempt(key));
            }
        });
    }

    #[instrument(skip(self))]
    pub async fn delete_peer(&self, key: &PeerKey) -> Result<(), ActionError> {
        match self.client.delete_peer(key).await {
            Ok(_) => {
                self.notify(NoticeSlot::Peer, Notice::info(format!("Removed {}", key)))
                    .await;
                self.refresh_in_background(PollSource::Peers);
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Peer, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn reset_node(&self) -> Result<(), ActionError> {
        match self.client.reset().await {
            Ok(_) => {
                self.notify(NoticeSlot::Peer, Notice::info("Node data reset"))
                    .await;
                self.refresh_in_background(PollSource::Peers);
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Peer, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn show_peer_logs(&self, key: &PeerKey) -> Result<PeerLogs, ActionError> {
        let response = self.client.peer_logs(key).await?;
        let logs = PeerLogs::new(key.clone(), response.logs);
        self.state.write().await.peer_logs = Some(logs.clone());
        self.emit(UiEvent::Input);
        Ok(logs)
    }

    pub async fn close_peer_logs(&self) {
        self.state.write().await.peer_logs = None;
        self.emit(UiEvent::Input);
    }

    /// Run the node's NAT test
    ///
    /// With `ui.nat_test_sends_seed_ip` the seed field goes out as `stun_ip`;
    /// an empty field sends no `stun_ip` so the node uses its own STUN target.
    #[instrument(skip(self))]
    pub async fn nat_test(&self) -> Result<bool, ActionError> {
        let stun_ip = if self.config.ui.nat_test_sends_seed_ip {
            Some(self.state.read().await.seed.value().to_string()).filter(|ip| !ip.is_empty())
        } else {
            None
        };
        self.notify(NoticeSlot::Nat, Notice::info("Testing...")).await;

        match self.client.nat_test(&NatTestRequest { stun_ip }).await {
            Ok(response) => {
                let message = response.message.unwrap_or_default();
                let notice = if response.success {
                    Notice::info(format!("SUCCESS: {}", message))
                } else if message.is_empty() {
                    Notice::error("FAILED: Timeout")
                } else {
                    Notice::error(format!("FAILED: {}", message))
                };
                self.notify(NoticeSlot::Nat, notice).await;
                Ok(response.success)
            }
            Err(e) => self.report(NoticeSlot::Nat, Err(e.into())).await,
        }
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn create_wallet(&self, name: &str) -> Result<Option<String>, ActionError> {
        let name = name.trim();
        if name.is_empty() {
            let invalid = Err(ActionError::InvalidInput("Enter Name".to_string()));
            return self.report(NoticeSlot::Wallet, invalid).await;
        }

        match self.client.create_wallet(name).await {
            Ok(response) => {
                self.notify(NoticeSlot::Wallet, Notice::info(format!("Created wallet {}", name)))
                    .await;
                self.refresh(PollSource::Wallets).await;
                Ok(response.address)
            }
            Err(e) => self.report(NoticeSlot::Wallet, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_selected_wallet(&self) -> Result<String, ActionError> {
        let selected = self.selected_wallet().await;
        let address = self.report(NoticeSlot::Wallet, selected).await?;
        match self.client.delete_wallet(&address).await {
            Ok(_) => {
                self.notify(NoticeSlot::Wallet, Notice::info("Wallet deleted"))
                    .await;
                self.refresh(PollSource::Wallets).await;
                Ok(address)
            }
            Err(e) => self.report(NoticeSlot::Wallet, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn rename_selected_wallet(&self, name: &str) -> Result<(), ActionError> {
        let name = name.trim();
        if name.is_empty() {
            let invalid = Err(ActionError::InvalidInput("Enter a name".to_string()));
            return self.report(NoticeSlot::Wallet, invalid).await;
        }
        let selected = self.selected_wallet().await;
        let address = self.report(NoticeSlot::Wallet, selected).await?;

        match self.client.rename_wallet(&address, name).await {
            Ok(_) => {
                self.notify(NoticeSlot::Wallet, Notice::info(format!("Renamed to {}", name)))
                    .await;
                self.refresh(PollSource::Wallets).await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Wallet, Err(e.into())).await,
        }
    }

    /// Send from the selected wallet. Returns the transaction id when reported.
    #[instrument(skip(self))]
    pub async fn send(&self, to: &str, amount: f64) -> Result<Option<String>, ActionError> {
        let selected = self.selected_wallet().await;
        let from = self.report(NoticeSlot::Send, selected).await?;
        let to = to.trim();
        if to.is_empty() || !amount.is_finite() || amount <= 0.0 {
            let invalid = Err(ActionError::InvalidInput("Fill fields".to_string()));
            return self.report(NoticeSlot::Send, invalid).await;
        }
        self.notify(NoticeSlot::Send, Notice::info("Sending...")).await;

        let request = SendRequest {
            from,
            to: to.to_string(),
            amount,
        };
        match self.client.send(&request).await {
            Ok(response) => {
                let text = match &response.txid {
                    Some(txid) => {
                        let short: String = txid.chars().take(16).collect();
                        format!("SENT! TxID: {}...", short)
                    }
                    None => "SENT!".to_string(),
                };
                self.notify(NoticeSlot::Send, Notice::info(text)).await;
                self.refresh_in_background(PollSource::Wallets);
                Ok(response.txid)
            }
            Err(e) => self.report(NoticeSlot::Send, Err(e.into())).await,
        }
    }

    /// Import wallets from a JSON document (a list, or one wallet object)
    #[instrument(skip(self, document))]
    pub async fn import_wallets(&self, document: &str) -> Result<Option<u64>, ActionError> {
        let parsed = serde_json::from_str::<Value>(document)
            .map_err(|_| ActionError::InvalidInput("Invalid JSON".to_string()));
        let parsed = self.report(NoticeSlot::Wallet, parsed).await?;
        let entries = match parsed {
            Value::Array(entries) => entries,
            other => vec![other],
        };

        match self.client.import_wallets(&entries).await {
            Ok(response) => {
                self.notify(NoticeSlot::Wallet, Notice::info("Wallets Imported"))
                    .await;
                self.refresh(PollSource::Wallets).await;
                Ok(response.count)
            }
            Err(e) => self.report(NoticeSlot::Wallet, Err(e.into())).await,
        }
    }

    pub async fn export_wallets(&self) -> Result<Value, ActionError> {
        Ok(self.client.export_wallets().await?)
    }

    // =========================================================================
    // Miner / beggar registry
    // =========================================================================

    /// Start mining to the selected wallet (node default when none is selected)
    #[instrument(skip(self))]
    pub async fn start_mining(&self) -> Result<(), ActionError> {
        let target = self.selected_wallet().await.ok();
        match self.client.start_miner(target.as_deref()).await {
            Ok(_) => {
                self.refresh(PollSource::Miner).await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Miner, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn stop_mining(&self) -> Result<(), ActionError> {
        match self.client.stop_miner().await {
            Ok(_) => {
                self.refresh(PollSource::Miner).await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Miner, Err(e.into())).await,
        }
    }

    /// Advertise `address` (or the selected wallet) in the beggar registry
    #[instrument(skip(self))]
    pub async fn start_beg(&self, address: Option<&str>) -> Result<(), ActionError> {
        let address = match address {
            Some(address) if !address.trim().is_empty() => address.trim().to_string(),
            _ => {
                let selected = self.selected_wallet().await;
                self.report(NoticeSlot::Beg, selected).await?
            }
        };

        match self.client.start_beg(&address).await {
            Ok(_) => {
                self.refresh(PollSource::Beggars).await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Beg, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn stop_beg(&self) -> Result<(), ActionError> {
        match self.client.stop_beg().await {
            Ok(_) => {
                self.refresh(PollSource::Beggars).await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Beg, Err(e.into())).await,
        }
    }

    /// Open the registry view: starts the elevated registry timer
    pub async fn open_registry(&self) {
        self.state.write().await.registry_open = true;
        self.emit(UiEvent::Input);
        self.poller
            .start(
                TimerKey::elevated(PollSource::Beggars),
                self.config.polling.registry_interval(),
            )
            .await;
    }

    /// Close the registry view: stops only the elevated timer
    pub async fn close_registry(&self) {
        self.poller
            .stop(TimerKey::elevated(PollSource::Beggars))
            .await;
        self.state.write().await.registry_open = false;
        self.emit(UiEvent::Input);
    }

    // =========================================================================
    // Node maintenance
    // =========================================================================

    pub async fn load_rpc_config(&self) -> Result<RpcConfig, ActionError> {
        let config = self.client.rpc_config().await?;
        self.state.write().await.rpc = Some(config.clone());
        self.emit(UiEvent::Notice(NoticeSlot::Rpc));
        Ok(config)
    }

    #[instrument(skip(self, config))]
    pub async fn save_rpc_config(&self, config: RpcConfig) -> Result<(), ActionError> {
        match self.client.set_rpc_config(&config).await {
            Ok(saved) => {
                self.state.write().await.rpc = Some(saved);
                self.notify(NoticeSlot::Rpc, Notice::info("RPC settings saved"))
                    .await;
                Ok(())
            }
            Err(e) => self.report(NoticeSlot::Rpc, Err(e.into())).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn integrity_check(&self) -> Result<bool, ActionError> {
        match self.client.integrity_check().await {
            Ok(report) => {
                let ok = report.is_ok();
                self.state.write().await.integrity = Some(report);
                self.emit(UiEvent::Notice(NoticeSlot::Integrity));
                Ok(ok)
            }
            Err(e) => self.report(NoticeSlot::Integrity, Err(e.into())).await,
        }
    }
}
