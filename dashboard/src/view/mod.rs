//! Pure rendering of [`AppState`] into a [`DashboardView`]
//!
//! `render` performs no I/O and reads no clock: the wall-clock time used for
//! "seen N minutes ago" is passed in. Rendering the same state at the same
//! time twice yields equal views, which is what lets the console apply step
//! suppress duplicate output.

#[cfg(test)]
mod tests;

use icsi_node_api::{IntegrityReport, NetworkStats, PeerKey, RpcConfig};
use serde::Serialize;

use crate::config::UiConfig;
use crate::entity::{format_countdown, AttemptPhase, BegSession, DiscoveryState};
use crate::reconciler::{is_active_status, network_reachable, peer_matches_filter};
use crate::state::{AppState, Notice, NoticeSlot, PeerLogs};

/// Render-time settings taken from `[ui]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub default_peer_port: u16,
    pub miner_log_lines: usize,
}

impl From<&UiConfig> for RenderOptions {
    fn from(ui: &UiConfig) -> Self {
        Self {
            default_peer_port: ui.default_peer_port,
            miner_log_lines: ui.miner_log_lines,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&UiConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub uplink: Uplink,
    pub peer_count: usize,
    pub height: Option<u64>,
    pub filter: String,
    pub peers: Vec<PeerRow>,
    pub connect: ConnectControl,
    pub attempts: Vec<AttemptRow>,
    pub discovery: DiscoveryView,
    pub stats: Option<StatsView>,
    pub wallets: WalletPanel,
    pub miner: MinerPanel,
    pub beg: BegPanel,
    /// Present only while the registry view is open
    pub registry: Option<RegistryView>,
    pub notices: Vec<NoticeView>,
    pub peer_logs: Option<PeerLogsView>,
    pub rpc: Option<RpcView>,
    pub integrity: Option<IntegrityView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Uplink {
    Online,
    Offline,
}

impl Uplink {
    pub fn label(self) -> &'static str {
        match self {
            Uplink::Online => "ONLINE",
            Uplink::Offline => "OFFLINE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRow {
    pub key: String,
    pub ip: String,
    pub port: u16,
    pub status: String,
    pub active: bool,
    pub can_delete: bool,
    pub attempt: AttemptPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectControl {
    pub seed: String,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRow {
    pub target: String,
    pub phase: AttemptPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryView {
    pub state: DiscoveryState,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub difficulty: String,
    pub difficulty_countdown: Option<String>,
    pub reward: String,
    pub halving: String,
    pub hashrate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletOption {
    pub address: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletPanel {
    pub options: Vec<WalletOption>,
    pub balance: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinerPanel {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub terminal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "region", rename_all = "snake_case")]
pub enum BegPanel {
    Start { options: Vec<WalletOption> },
    Active { address: String, countdown: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryRow {
    pub address: String,
    pub short_address: String,
    pub balance: String,
    pub seen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryView {
    pub rows: Vec<RegistryRow>,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeView {
    pub slot: NoticeSlot,
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerLogsView {
    pub title: String,
    pub content: String,
    pub block_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcView {
    pub user: String,
    pub password_set: bool,
    pub enforce_auth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityView {
    pub ok: bool,
    pub summary: String,
}

const CONNECT_IDLE_LABEL: &str = "[ ADD NODE ]";
const EMPTY_REGISTRY_MESSAGE: &str = "No beggars on the network yet.";

pub fn render(state: &AppState, now: i64, options: &RenderOptions) -> DashboardView {
    let peers = state.peers.items();
    let uplink = if network_reachable(peers) {
        Uplink::Online
    } else {
        Uplink::Offline
    };

    DashboardView {
        uplink,
        peer_count: peers.len(),
        height: state.height,
        filter: state.peer_filter.clone(),
        peers: render_peers(state),
        connect: render_connect(state, options),
        attempts: render_attempts(state),
        discovery: DiscoveryView {
            state: state.discovery.clone(),
            label: state.discovery.label(),
        },
        stats: state.stats.as_ref().map(render_stats),
        wallets: render_wallets(state),
        miner: render_miner(state, options),
        beg: render_beg(state),
        registry: state.registry_open.then(|| render_registry(state, now)),
        notices: render_notices(state),
        peer_logs: state.peer_logs.as_ref().map(render_peer_logs),
        rpc: state.rpc.as_ref().map(render_rpc),
        integrity: state.integrity.as_ref().map(render_integrity),
    }
}

fn render_peers(state: &AppState) -> Vec<PeerRow> {
    state
        .peers
        .items()
        .iter()
        .filter(|peer| peer_matches_filter(peer, &state.peer_filter))
        .map(|peer| {
            let key = peer.key();
            PeerRow {
                key: key.to_string(),
                ip: peer.ip.clone(),
                port: peer.port,
                status: peer.status.clone(),
                active: is_active_status(&peer.status),
                can_delete: peer.can_delete,
                attempt: state.attempts.phase(&key),
            }
        })
        .collect()
}

fn render_connect(state: &AppState, options: &RenderOptions) -> ConnectControl {
    let seed = state.seed.value().to_string();
    let phase = PeerKey::parse_with_default(&seed, options.default_peer_port)
        .map(|key| state.attempts.phase(&key))
        .unwrap_or_default();

    let label = match phase {
        AttemptPhase::Idle => CONNECT_IDLE_LABEL,
        AttemptPhase::Pending => "CONNECTING...",
        AttemptPhase::Succeeded => "CONNECTED",
        AttemptPhase::Failed => "FAILED",
    };

    ConnectControl {
        seed,
        label: label.to_string(),
        enabled: phase != AttemptPhase::Pending,
    }
}

fn render_attempts(state: &AppState) -> Vec<AttemptRow> {
    let mut rows: Vec<AttemptRow> = state
        .attempts
        .active()
        .map(|(key, phase)| AttemptRow {
            target: key.to_string(),
            phase,
        })
        .collect();
    // HashMap order is arbitrary; sort so equal state renders equal views
    rows.sort_by(|a, b| a.target.cmp(&b.target));
    rows
}

fn render_stats(stats: &NetworkStats) -> StatsView {
    StatsView {
        difficulty: stats.difficulty.to_string(),
        difficulty_countdown: stats
            .difficulty_countdown
            .map(|blocks| format!("{} Blocks", blocks)),
        reward: format!("{:.8} ICSI", stats.reward),
        halving: format!("{} Blocks", stats.halving_countdown),
        hashrate: stats.network_hashrate.map(format_hashrate),
    }
}

fn format_hashrate(hashes_per_second: f64) -> String {
    const UNITS: [&str; 5] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s"];
    let mut value = hashes_per_second;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

fn render_wallets(state: &AppState) -> WalletPanel {
    let selected = state.wallets.selected_address();
    let options = state
        .wallets
        .wallets()
        .iter()
        .map(|wallet| WalletOption {
            address: wallet.address.clone(),
            label: format!("[{:.2}] {}", wallet.available, wallet.name),
            selected: selected == Some(wallet.address.as_str()),
        })
        .collect();

    let (balance, address) = match state.wallets.selected() {
        Some(wallet) => (format!("{:.2}", wallet.available), wallet.address.clone()),
        None => ("0.00".to_string(), "---".to_string()),
    };

    WalletPanel {
        options,
        balance,
        address,
    }
}

fn render_miner(state: &AppState, options: &RenderOptions) -> MinerPanel {
    match &state.miner {
        Some(miner) => {
            let skip = miner.logs.len().saturating_sub(options.miner_log_lines);
            MinerPanel {
                start_enabled: !miner.is_mining,
                stop_enabled: miner.is_mining,
                terminal: miner.logs[skip..].to_vec(),
            }
        }
        // Status unknown until the first miner poll lands
        None => MinerPanel {
            start_enabled: false,
            stop_enabled: false,
            terminal: Vec::new(),
        },
    }
}

fn render_beg(state: &AppState) -> BegPanel {
    match &state.beg {
        BegSession::Active(beg) => BegPanel::Active {
            address: beg.address.clone(),
            countdown: format_countdown(beg.remaining_seconds),
        },
        BegSession::Inactive => BegPanel::Start {
            options: state
                .wallets
                .wallets()
                .iter()
                .map(|wallet| WalletOption {
                    address: wallet.address.clone(),
                    label: format!(
                        "{}...  ({:.4} iCSI)",
                        prefix(&wallet.address, 12),
                        wallet.available
                    ),
                    selected: false,
                })
                .collect(),
        },
    }
}

fn render_registry(state: &AppState, now: i64) -> RegistryView {
    let rows: Vec<RegistryRow> = state
        .beggars
        .items()
        .iter()
        .map(|listing| RegistryRow {
            address: listing.address.clone(),
            short_address: short_address(&listing.address),
            balance: format!("{:.4} iCSI", listing.balance),
            seen: format!("Seen {}m ago", minutes_since(listing.last_seen, now)),
        })
        .collect();

    let empty_message = rows
        .is_empty()
        .then(|| EMPTY_REGISTRY_MESSAGE.to_string());
    RegistryView {
        rows,
        empty_message,
    }
}

/// Whole minutes between `last_seen` and `now`; clock skew clamps to 0
pub fn minutes_since(last_seen: i64, now: i64) -> i64 {
    (now - last_seen).max(0) / 60
}

/// `first10...last10` for addresses longer than 20 characters
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 20 {
        return address.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{}...{}", head, tail)
}

fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn render_notices(state: &AppState) -> Vec<NoticeView> {
    state
        .notices
        .iter()
        .map(|(slot, Notice { text, is_error })| NoticeView {
            slot: *slot,
            text: text.clone(),
            is_error: *is_error,
        })
        .collect()
}

fn render_peer_logs(logs: &PeerLogs) -> PeerLogsView {
    let content = if logs.lines.is_empty() {
        "No logs.".to_string()
    } else {
        logs.lines.join("\n")
    };
    PeerLogsView {
        title: format!("LOGS: {}", logs.key),
        content,
        block_count: logs.block_count,
    }
}

fn render_rpc(rpc: &RpcConfig) -> RpcView {
    RpcView {
        user: rpc.user.clone(),
        password_set: !rpc.password.is_empty(),
        enforce_auth: rpc.enforce_auth,
    }
}

fn render_integrity(report: &IntegrityReport) -> IntegrityView {
    let ok = report.is_ok();
    let mut summary = if ok {
        "Chain integrity OK".to_string()
    } else {
        format!(
            "Chain integrity {}: {}",
            report.status.to_uppercase(),
            report.message.as_deref().unwrap_or("no details")
        )
    };

    if let Some(network) = &report.network {
        let heights = match (network.local_height, network.peer_height) {
            (Some(local), Some(peer)) => format!(", height {}/{}", local, peer),
            (Some(local), None) => format!(", height {}", local),
            _ => String::new(),
        };
        summary.push_str(&format!(
            " (peers {}, {}{})",
            network.peer_count,
            if network.synced { "synced" } else { "not synced" },
            heights
        ));
    }

    IntegrityView { ok, summary }
}
