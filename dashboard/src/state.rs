//! Application state shared by sync tasks, actions and the renderer
//!
//! Writers:
//! - each source's sync task owns its snapshot fields
//! - action handlers own the entity state machines and notices
//!
//! The renderer only takes read locks.

use std::collections::BTreeMap;
use std::sync::Arc;

use icsi_node_api::{
    BeggarListing, IntegrityReport, MinerStatus, NetworkStats, Peer, PeerKey, RpcConfig,
};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::entity::{BegSession, ConnectionAttempts, DiscoveryState, SeedField};
use crate::poller::PollSource;
use crate::reconciler::{Snapshot, WalletBook};

pub type SharedState = Arc<RwLock<AppState>>;

/// Render trigger sent after anything visible changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A poll tick reconciled fresh data
    Snapshot(PollSource),
    /// A connection attempt changed phase
    Attempt(PeerKey),
    /// An action posted or replaced a notice
    Notice(NoticeSlot),
    /// Local input (seed, filter, selection, registry view)
    Input,
}

pub fn event_channel() -> (broadcast::Sender<UiEvent>, broadcast::Receiver<UiEvent>) {
    broadcast::channel(64)
}

/// Where an inline action result is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSlot {
    Connect,
    Peer,
    Nat,
    Wallet,
    Send,
    Miner,
    Beg,
    Rpc,
    Integrity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Log viewer contents for one peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerLogs {
    pub key: PeerKey,
    pub lines: Vec<String>,
    pub block_count: usize,
}

impl PeerLogs {
    pub fn new(key: PeerKey, lines: Vec<String>) -> Self {
        let block_count = lines.iter().filter(|line| mentions_block(line)).count();
        Self {
            key,
            lines,
            block_count,
        }
    }
}

/// Whole-word, case-insensitive match on "block"
fn mentions_block(line: &str) -> bool {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case("block"))
}

#[derive(Debug, Default)]
pub struct AppState {
    // Peers source
    pub peers: Snapshot<Peer>,
    pub height: Option<u64>,

    // Stats / miner sources, replaced wholesale
    pub stats: Option<NetworkStats>,
    pub miner: Option<MinerStatus>,

    // Wallets source plus the selection
    pub wallets: WalletBook,

    // Discovery source
    pub discovery: DiscoveryState,
    pub own_ip: Option<String>,

    // Beggar registry source
    pub beggars: Snapshot<BeggarListing>,
    pub beg: BegSession,
    pub registry_open: bool,

    // Local input and entity state
    pub seed: SeedField,
    pub peer_filter: String,
    pub attempts: ConnectionAttempts,
    pub notices: BTreeMap<NoticeSlot, Notice>,
    pub peer_logs: Option<PeerLogs>,
    pub rpc: Option<RpcConfig>,
    pub integrity: Option<IntegrityReport>,
}

impl AppState {
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn notice(&self, slot: NoticeSlot) -> Option<&Notice> {
        self.notices.get(&slot)
    }

    pub fn set_notice(&mut self, slot: NoticeSlot, notice: Notice) {
        self.notices.insert(slot, notice);
    }
}
