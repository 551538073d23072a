//! Client-side UI state machines that live outside the polled snapshots

pub mod beg;
pub mod connection;
pub mod discovery;

pub use beg::{format_countdown, BegSession};
pub use connection::{
    AttemptError, AttemptPhase, ConnectVerdict, ConnectionAttempts, ATTEMPT_DECAY,
};
pub use discovery::{DiscoveryState, SeedField};
