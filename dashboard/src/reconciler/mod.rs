//! Snapshot reconciliation
//!
//! Each polled collection lives in a [`Snapshot`]. A fresh payload is compared
//! against it position by position:
//! - same length and same identity key at every index → patch in place
//! - anything else (added, removed, reordered) → full rebuild
//!
//! Filtering is a render concern and never reaches this module.

mod wallets;


pub use wallets::WalletBook;

use icsi_node_api::{BeggarListing, Peer, PeerKey, Wallet, STATUS_TOKEN_ACTIVE};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Entities with a stable identity key
pub trait Keyed {
    type Key: PartialEq + Clone + Debug;

    fn identity(&self) -> Self::Key;
}

impl Keyed for Peer {
    type Key = PeerKey;

    fn identity(&self) -> PeerKey {
        self.key()
    }
}

impl Keyed for Wallet {
    type Key = String;

    fn identity(&self) -> String {
        self.address.clone()
    }
}

impl Keyed for BeggarListing {
    type Key = String;

    fn identity(&self) -> String {
        self.address.clone()
    }
}

/// What a reconciliation pass did to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Identities unchanged; `changed` entries had new attribute values
    Patched { changed: usize },
    /// Identity or order changed; the collection was rebuilt
    Rebuilt,
    /// Collection replaced wholesale without diffing
    Replaced,
}

impl Reconciliation {
    pub fn is_rebuild(&self) -> bool {
        matches!(self, Reconciliation::Rebuilt)
    }
}

/// Last fully reconciled copy of one server-side collection
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    items: Vec<T>,
    /// Bumped on every rebuild; stays put across patches
    generation: u64,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
        }
    }
}

impl<T> Snapshot<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T: Keyed + PartialEq> Snapshot<T> {
    /// True when `fresh` has the same identities in the same order
    pub fn same_identity(&self, fresh: &[T]) -> bool {
        self.items.len() == fresh.len()
            && self
                .items
                .iter()
                .zip(fresh)
                .all(|(old, new)| old.identity() == new.identity())
    }

    /// Fold a freshly fetched collection into the snapshot
    pub fn reconcile(&mut self, fresh: Vec<T>) -> Reconciliation {
        if !self.same_identity(&fresh) {
            self.items = fresh;
            self.generation += 1;
            return Reconciliation::Rebuilt;
        }

        let mut changed = 0;
        for (slot, new) in self.items.iter_mut().zip(fresh) {
            if *slot != new {
                *slot = new;
                changed += 1;
            }
        }
        Reconciliation::Patched { changed }
    }

    pub fn find(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.identity() == *key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.find(key).is_some()
    }
}

/// Whether a peer status counts as a live connection (case-insensitive)
pub fn is_active_status(status: &str) -> bool {
    const ACCEPTED_TOKENS: [&str; 1] = [STATUS_TOKEN_ACTIVE];
    let upper = status.to_uppercase();
    ACCEPTED_TOKENS.iter().any(|token| upper.contains(token))
}

/// Rollup: at least one peer in the snapshot is active
pub fn network_reachable(peers: &[Peer]) -> bool {
    peers.iter().any(|peer| is_active_status(&peer.status))
}

/// Case-insensitive substring filter on the peer's `ip:port` key
pub fn peer_matches_filter(peer: &Peer, filter: &str) -> bool {
    let filter = filter.trim();
    filter.is_empty()
        || peer
            .key()
            .to_string()
            .to_lowercase()
            .contains(&filter.to_lowercase())
}
