// node-api/src/constants.rs
//
// REST endpoint paths exposed by the node's web server.
// Shared by the dashboard client and the e2e stub node so both sides agree.

// =============================================================================
// Network
// =============================================================================

pub const PATH_CONNECT: &str = "/api/connect";
pub const PATH_PEERS: &str = "/api/peers";
pub const PATH_PEERS_DELETE: &str = "/api/peers/delete";
pub const PATH_RESET: &str = "/api/reset";
pub const PATH_LOGS: &str = "/api/logs";
pub const PATH_STATS: &str = "/api/stats";
pub const PATH_DISCOVERY: &str = "/api/discovery/status";
pub const PATH_NAT_TEST: &str = "/api/stun/test";
pub const PATH_INTEGRITY_CHECK: &str = "/api/integrity_check";

// =============================================================================
// Wallet
// =============================================================================

pub const PATH_WALLET_LIST: &str = "/api/wallet/list";
pub const PATH_WALLET_CREATE: &str = "/api/wallet/create";
pub const PATH_WALLET_DELETE: &str = "/api/wallet/delete";
pub const PATH_WALLET_RENAME: &str = "/api/wallet/rename";
pub const PATH_WALLET_SEND: &str = "/api/wallet/send";
pub const PATH_WALLET_IMPORT: &str = "/api/wallet/import";
pub const PATH_WALLET_EXPORT: &str = "/api/wallet/export";

// =============================================================================
// Miner / Beggar / RPC
// =============================================================================

pub const PATH_MINER_STATUS: &str = "/api/miner/status";
pub const PATH_MINER_START: &str = "/api/miner/start";
pub const PATH_MINER_STOP: &str = "/api/miner/stop";

pub const PATH_BEGGAR_START: &str = "/api/beggar/start";
pub const PATH_BEGGAR_STOP: &str = "/api/beggar/stop";
pub const PATH_BEGGAR_LIST: &str = "/api/beggar/list";

pub const PATH_RPC_CONFIG: &str = "/api/rpc/config";

/// Peer status token that marks a live connection ("ACTIVE", "ACTIVE (ICE)")
pub const STATUS_TOKEN_ACTIVE: &str = "ACTIVE";
