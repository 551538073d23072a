use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::poller::PollSource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Base URL of the node's web server (e.g., "http://127.0.0.1:9340")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:9340".to_string()
}
fn default_request_timeout_ms() -> u64 {
    5000
}

impl NodeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            bail!("node request_timeout_ms must be greater than 0");
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Poll period per source, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_peers_ms")]
    pub peers_ms: u64,
    #[serde(default = "default_miner_ms")]
    pub miner_ms: u64,
    #[serde(default = "default_stats_ms")]
    pub stats_ms: u64,
    #[serde(default = "default_wallets_ms")]
    pub wallets_ms: u64,
    #[serde(default = "default_discovery_ms")]
    pub discovery_ms: u64,
    #[serde(default = "default_beggars_ms")]
    pub beggars_ms: u64,
    /// Extra registry poll that only runs while the registry view is open
    #[serde(default = "default_beggar_registry_ms")]
    pub beggar_registry_ms: u64,
}

fn default_peers_ms() -> u64 {
    2000
}
fn default_miner_ms() -> u64 {
    1000
}
fn default_stats_ms() -> u64 {
    5000
}
fn default_wallets_ms() -> u64 {
    5000
}
fn default_discovery_ms() -> u64 {
    5000
}
fn default_beggars_ms() -> u64 {
    5000
}
fn default_beggar_registry_ms() -> u64 {
    5000
}

impl PollingConfig {
    /// Baseline period for a source
    pub fn interval_for(&self, source: PollSource) -> Duration {
        let ms = match source {
            PollSource::Peers => self.peers_ms,
            PollSource::Miner => self.miner_ms,
            PollSource::Stats => self.stats_ms,
            PollSource::Wallets => self.wallets_ms,
            PollSource::Discovery => self.discovery_ms,
            PollSource::Beggars => self.beggars_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn registry_interval(&self) -> Duration {
        Duration::from_millis(self.beggar_registry_ms)
    }

    fn validate(&self) -> Result<()> {
        for source in PollSource::ALL {
            if self.interval_for(source).is_zero() {
                bail!("polling interval for {} must be greater than 0", source);
            }
        }
        if self.beggar_registry_ms == 0 {
            bail!("polling interval for beggar registry must be greater than 0");
        }
        Ok(())
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            peers_ms: default_peers_ms(),
            miner_ms: default_miner_ms(),
            stats_ms: default_stats_ms(),
            wallets_ms: default_wallets_ms(),
            discovery_ms: default_discovery_ms(),
            beggars_ms: default_beggars_ms(),
            beggar_registry_ms: default_beggar_registry_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Port assumed when the seed field holds a bare host
    #[serde(default = "default_peer_port")]
    pub default_peer_port: u16,
    /// Send the seed field as `stun_ip` with the NAT test.
    /// When false the node falls back to its own configured STUN target.
    #[serde(default = "default_nat_test_sends_seed_ip")]
    pub nat_test_sends_seed_ip: bool,
    /// Number of miner log lines shown in the terminal panel
    #[serde(default = "default_miner_log_lines")]
    pub miner_log_lines: usize,
}

fn default_peer_port() -> u16 {
    9341
}
fn default_nat_test_sends_seed_ip() -> bool {
    true
}
fn default_miner_log_lines() -> usize {
    20
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_peer_port: default_peer_port(),
            nat_test_sends_seed_ip: default_nat_test_sends_seed_ip(),
            miner_log_lines: default_miner_log_lines(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    /// Directory for log files (relative to working directory or absolute path)
    #[serde(default = "default_log_directory")]
    pub directory: String,
    /// Prefix for log file names
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotation strategy: "daily", "hourly", or "never"
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
    /// Maximum number of log files to keep (0 = unlimited)
    #[serde(default = "default_max_files")]
    pub max_files: u32,
    /// Maximum age of log files in days (0 = unlimited)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

fn default_logging_enabled() -> bool {
    false
}
fn default_log_directory() -> String {
    "logs".to_string()
}
fn default_log_file_prefix() -> String {
    "icsi-dashboard".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}
fn default_max_files() -> u32 {
    14
}
fn default_max_age_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            max_files: default_max_files(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl Config {
    /// Load config from layered TOML files
    ///
    /// Loads configuration files in the following order (later files override earlier):
    /// 1. {base_name}.toml (optional, built-in defaults apply when missing)
    /// 2. {base_name}.{ENV}.toml (optional, only if CONFIG_ENV is set)
    /// 3. {base_name}.local.toml (optional, for personal overrides, git-ignored)
    ///
    /// # Environment Variables
    /// * `CONFIG_ENV` - If set, loads {base_name}.{CONFIG_ENV}.toml (e.g., config.dev.toml)
    pub fn from_file<P: AsRef<Path>>(base_name: P) -> Result<Self> {
        let base_path = base_name.as_ref();
        let base_str = base_path.to_str().context("Invalid base path")?;

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(base_str).required(false));

        if let Ok(env) = std::env::var("CONFIG_ENV") {
            let env_config = format!("{}.{}", base_str, env);
            builder = builder.add_source(config::File::with_name(&env_config).required(false));
        }

        let local_config = format!("{}.local", base_str);
        builder = builder.add_source(config::File::with_name(&local_config).required(false));

        let config: Config = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.node.validate()?;
        config.polling.validate()?;
        Ok(config)
    }
}
