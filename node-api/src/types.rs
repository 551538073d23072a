// Location: node-api/src/types.rs
// Purpose: Type definitions for JSON payloads exchanged with the node's REST API
// Why: One place for request/response shapes so polls and actions decode identically

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Peers
// =============================================================================

/// Identity of a peer: the (ip, port) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerKey {
    pub ip: String,
    pub port: u16,
}

impl PeerKey {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
        }
    }

    /// Parse `host:port`, falling back to `default_port` when the port is omitted
    pub fn parse_with_default(s: &str, default_port: u16) -> Result<Self, PeerKeyError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PeerKeyError::Empty);
        }
        match s.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(PeerKeyError::Empty);
                }
                let port = port
                    .parse::<u16>()
                    .map_err(|_| PeerKeyError::InvalidPort(port.to_string()))?;
                Ok(Self::new(host, port))
            }
            None => Ok(Self::new(s, default_port)),
        }
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for PeerKey {
    type Err = PeerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.trim().rsplit_once(':').ok_or(PeerKeyError::MissingPort)?;
        if host.is_empty() {
            return Err(PeerKeyError::Empty);
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| PeerKeyError::InvalidPort(port.to_string()))?;
        Ok(Self::new(host, port))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerKeyError {
    #[error("peer address is empty")]
    Empty,
    #[error("peer address must be host:port")]
    MissingPort,
    #[error("invalid port: {0}")]
    InvalidPort(String),
}

/// Peer entry as reported by GET /api/peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub ip: String,
    pub port: u16,
    /// Free-form status tag: "ACTIVE", "ACTIVE (ICE)", "DISCOVERED", "FAILED: ..."
    pub status: String,
    #[serde(default)]
    pub can_delete: bool,
}

impl Peer {
    pub fn key(&self) -> PeerKey {
        PeerKey::new(self.ip.clone(), self.port)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeersResponse {
    #[serde(default)]
    pub peers: Vec<Peer>,
    #[serde(default)]
    pub height: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePeerRequest {
    pub ip: String,
    pub port: u16,
}

// =============================================================================
// Connect
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// Target in `host:port` form
    pub seed_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectResult {
    pub target: String,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub connected_count: u32,
    #[serde(default)]
    pub results: Vec<ConnectResult>,
}

// =============================================================================
// Stats / Discovery / NAT / Logs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub difficulty_countdown: Option<u64>,
    #[serde(default)]
    pub reward: f64,
    #[serde(default)]
    pub halving_countdown: u64,
    #[serde(default)]
    pub network_hashrate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStatus {
    #[serde(default)]
    pub discovered_seed: Option<String>,
    #[serde(default)]
    pub own_ip: Option<String>,
    /// Entries are only counted, so their shape is left open
    #[serde(default)]
    pub known_multicast_peers: Vec<serde_json::Value>,
    #[serde(default)]
    pub beacon_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NatTestRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stun_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatTestResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<String>,
}

// =============================================================================
// Wallet
// =============================================================================

/// Wallet entry as reported by GET /api/wallet/list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub address: String,
    #[serde(default = "default_wallet_name")]
    pub name: String,
    /// Older nodes report a single `balance`
    #[serde(default, alias = "balance")]
    pub available: f64,
    #[serde(default)]
    pub confirmed: f64,
    #[serde(default)]
    pub pending: f64,
}

fn default_wallet_name() -> String {
    "Unnamed Wallet".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletListResponse {
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWalletRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateWalletResponse {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAddressRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameWalletRequest {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Miner
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinerStatus {
    #[serde(default)]
    pub is_mining: bool,
    #[serde(default)]
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerStartRequest {
    pub target_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Beggar registry
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeggarStartRequest {
    pub address: String,
}

/// This node's own time-boxed listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBeg {
    pub address: String,
    #[serde(default)]
    pub remaining_seconds: u64,
}

/// One advertised address in the network-wide registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeggarListing {
    pub address: String,
    #[serde(default)]
    pub balance: f64,
    /// Unix seconds
    #[serde(default)]
    pub last_seen: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeggarListResponse {
    #[serde(default)]
    pub active_beg: Option<ActiveBeg>,
    #[serde(default)]
    pub beggars: Vec<BeggarListing>,
}

// =============================================================================
// RPC config / Integrity
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub enforce_auth: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityNetwork {
    #[serde(default)]
    pub peer_count: u64,
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub peer_height: Option<u64>,
    #[serde(default)]
    pub local_height: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub network: Option<IntegrityNetwork>,
    #[serde(default)]
    pub bad_block: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_key_display_and_parse() {
        let key: PeerKey = "10.0.0.5:9341".parse().unwrap();
        assert_eq!(key, PeerKey::new("10.0.0.5", 9341));
        assert_eq!(key.to_string(), "10.0.0.5:9341");
    }

    #[test]
    fn test_peer_key_requires_port_when_strict() {
        assert_eq!(
            "10.0.0.5".parse::<PeerKey>(),
            Err(PeerKeyError::MissingPort)
        );
        assert!(matches!(
            "10.0.0.5:abc".parse::<PeerKey>(),
            Err(PeerKeyError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_peer_key_default_port() {
        let key = PeerKey::parse_with_default(" 10.0.0.9 ", 9341).unwrap();
        assert_eq!(key, PeerKey::new("10.0.0.9", 9341));
        assert_eq!(
            PeerKey::parse_with_default("", 9341),
            Err(PeerKeyError::Empty)
        );
    }

    #[test]
    fn test_wallet_accepts_legacy_balance_field() {
        let json = r#"{"address": "abc", "name": "Main", "balance": 12.5}"#;
        let wallet: Wallet = serde_json::from_str(json).unwrap();
        assert_eq!(wallet.available, 12.5);
        assert_eq!(wallet.confirmed, 0.0);
    }

    #[test]
    fn test_wallet_default_name() {
        let wallet: Wallet = serde_json::from_str(r#"{"address": "abc"}"#).unwrap();
        assert_eq!(wallet.name, "Unnamed Wallet");
    }

    #[test]
    fn test_connect_request_omits_unset_flags() {
        let req = ConnectRequest {
            seed_ip: "10.0.0.5:9341".to_string(),
            force: None,
            wait: Some(true),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["seed_ip"], "10.0.0.5:9341");
        assert!(json.get("force").is_none());
        assert_eq!(json["wait"], true);
    }

    #[test]
    fn test_discovery_status_defaults() {
        let status: DiscoveryStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status, DiscoveryStatus::default());
    }

    #[test]
    fn test_integrity_report_ok_is_case_insensitive() {
        let report: IntegrityReport =
            serde_json::from_str(r#"{"status": "OK", "network": {"peer_count": 3, "synced": true}}"#)
                .unwrap();
        assert!(report.is_ok());
        assert_eq!(report.network.unwrap().peer_count, 3);
    }
}
