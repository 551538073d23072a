// Library interface for icsi-dashboard
// Exposes modules for the binary and for end-to-end testing

pub mod actions;
pub mod config;
pub mod console;
pub mod entity;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod reconciler;
pub mod state;
pub mod sync;
pub mod view;

pub use actions::{ActionError, Dashboard};
pub use config::Config;
pub use state::{AppState, SharedState, UiEvent};
pub use view::{render, DashboardView};
