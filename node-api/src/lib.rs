// Top-level modules
pub mod client;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export the client surface used by the dashboard
pub use client::{Fetched, NodeClient};
pub use errors::FetchError;

// Re-export payload types
pub use types::{
    ActiveBeg, BeggarListResponse, BeggarListing, ConnectRequest, ConnectResponse, ConnectResult,
    ControlResponse, CreateWalletResponse, DiscoveryStatus, ImportResponse, IntegrityNetwork,
    IntegrityReport, LogsResponse, MinerStatus, NatTestRequest, NatTestResponse, NetworkStats,
    Peer, PeerKey, PeerKeyError, PeersResponse, RpcConfig, SendRequest, SendResponse, Wallet,
    WalletListResponse,
};

// Re-export constants for both client and stub servers
pub use constants::STATUS_TOKEN_ACTIVE;
