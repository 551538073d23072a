//! Discovery indicator and seed field auto-fill

use icsi_node_api::DiscoveryStatus;
use serde::Serialize;

/// Discovery progress, highest precedence first:
/// SeedDiscovered > PeersFound > ScanningBeacon > NoSignal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DiscoveryState {
    #[default]
    NoSignal,
    ScanningBeacon,
    PeersFound(usize),
    SeedDiscovered(String),
}

impl DiscoveryState {
    pub fn from_status(status: &DiscoveryStatus) -> Self {
        match status.discovered_seed.as_deref() {
            Some(seed) if !seed.is_empty() => DiscoveryState::SeedDiscovered(seed.to_string()),
            _ if !status.known_multicast_peers.is_empty() => {
                DiscoveryState::PeersFound(status.known_multicast_peers.len())
            }
            _ if status.beacon_active => DiscoveryState::ScanningBeacon,
            _ => DiscoveryState::NoSignal,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DiscoveryState::NoSignal => "No signal".to_string(),
            DiscoveryState::ScanningBeacon => "Scanning for peers...".to_string(),
            DiscoveryState::PeersFound(count) => format!("{} peer(s) found", count),
            DiscoveryState::SeedDiscovered(seed) => format!("Seed found: {}", seed),
        }
    }
}

/// The user-editable seed address field
///
/// `autofilled` marks a value the dashboard wrote itself (the node's own ip
/// as a placeholder); such a value may still be replaced by a discovered seed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedField {
    value: String,
    autofilled: bool,
}

impl SeedField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_autofilled(&self) -> bool {
        self.autofilled
    }

    /// User edit. Clears the auto-fill marker.
    pub fn set_by_user(&mut self, value: &str) {
        self.value = value.trim().to_string();
        self.autofilled = false;
    }

    /// Apply a discovery poll. Returns true when the field changed.
    pub fn apply_discovery(&mut self, status: &DiscoveryStatus) -> bool {
        let own_ip = status.own_ip.as_deref().filter(|ip| !ip.is_empty());

        if let Some(seed) = status.discovered_seed.as_deref().filter(|s| !s.is_empty()) {
            if self.value == seed {
                return false;
            }
            let replaceable =
                self.value.is_empty() || self.autofilled || Some(self.value.as_str()) == own_ip;
            if !replaceable {
                return false;
            }
            self.value = seed.to_string();
            self.autofilled = false;
            return true;
        }

        match own_ip {
            Some(ip) if self.value.is_empty() => {
                self.value = ip.to_string();
                self.autofilled = true;
                true
            }
            _ => false,
        }
    }
}
