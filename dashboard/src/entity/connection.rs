//! Per-peer connection attempt state machine
//!
//! Idle → Pending → {Succeeded, Failed} → Idle after [`ATTEMPT_DECAY`].
//! Each attempt carries a generation number; a decay timer only reverts the
//! attempt that scheduled it, never a newer one for the same peer.

use std::collections::HashMap;
use std::time::Duration;

use icsi_node_api::{ConnectResponse, PeerKey};
use serde::Serialize;

/// Time a finished attempt stays visible before reverting to Idle
pub const ATTEMPT_DECAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl AttemptPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, AttemptPhase::Succeeded | AttemptPhase::Failed)
    }
}

/// How a connect response was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectVerdict {
    /// A `results` entry named this peer and carried its own success flag
    Explicit { success: bool },
    /// No entry named this peer, but the node reported live connections.
    /// Counted as success even though the count may belong to other peers.
    ImplicitFromCount { connected_count: u32 },
    /// No entry and no connections
    NotConnected,
}

impl ConnectVerdict {
    pub fn interpret(key: &PeerKey, response: &ConnectResponse) -> Self {
        let port = key.port.to_string();
        let explicit = response
            .results
            .iter()
            .find(|result| result.target.contains(&key.ip) && result.target.contains(&port));

        match explicit {
            Some(result) => ConnectVerdict::Explicit {
                success: result.success,
            },
            None if response.connected_count > 0 => ConnectVerdict::ImplicitFromCount {
                connected_count: response.connected_count,
            },
            None => ConnectVerdict::NotConnected,
        }
    }

    pub fn is_success(self) -> bool {
        match self {
            ConnectVerdict::Explicit { success } => success,
            ConnectVerdict::ImplicitFromCount { .. } => true,
            ConnectVerdict::NotConnected => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("a connection attempt to this peer is already in progress")]
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attempt {
    phase: AttemptPhase,
    generation: u64,
}

/// All live connection attempts, keyed by peer
#[derive(Debug, Clone, Default)]
pub struct ConnectionAttempts {
    attempts: HashMap<PeerKey, Attempt>,
    next_generation: u64,
}

impl ConnectionAttempts {
    pub fn phase(&self, key: &PeerKey) -> AttemptPhase {
        self.attempts
            .get(key)
            .map(|attempt| attempt.phase)
            .unwrap_or_default()
    }

    /// Idle/finished → Pending. Returns the new attempt's generation.
    pub fn begin(&mut self, key: &PeerKey) -> Result<u64, AttemptError> {
        if self.phase(key) == AttemptPhase::Pending {
            return Err(AttemptError::AlreadyPending);
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.attempts.insert(
            key.clone(),
            Attempt {
                phase: AttemptPhase::Pending,
                generation,
            },
        );
        Ok(generation)
    }

    /// Pending → Succeeded/Failed, only for the attempt that is still current
    pub fn finish(&mut self, key: &PeerKey, generation: u64, success: bool) -> bool {
        match self.attempts.get_mut(key) {
            Some(attempt)
                if attempt.generation == generation && attempt.phase == AttemptPhase::Pending =>
            {
                attempt.phase = if success {
                    AttemptPhase::Succeeded
                } else {
                    AttemptPhase::Failed
                };
                true
            }
            _ => false,
        }
    }

    /// Decay timer fired: finished → Idle if the attempt is still the same one
    pub fn expire(&mut self, key: &PeerKey, generation: u64) -> bool {
        let current = self
            .attempts
            .get(key)
            .is_some_and(|attempt| attempt.generation == generation && attempt.phase.is_finished());

        if current {
            self.attempts.remove(key);
        }
        current
    }

    /// Peers whose attempt is not Idle, for rendering
    pub fn active(&self) -> impl Iterator<Item = (&PeerKey, AttemptPhase)> {
        self.attempts.iter().map(|(key, attempt)| (key, attempt.phase))
    }
}
