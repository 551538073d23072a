//! Console front end: line commands in, rendered view out
//!
//! [`ConsoleRenderer`] is the apply step. It writes a view only when it
//! differs from the last one it wrote, so repeated render triggers over
//! unchanged state produce no output.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use icsi_node_api::{PeerKey, RpcConfig};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::actions::Dashboard;
use crate::view::{BegPanel, DashboardView};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect(Option<String>),
    Seed(String),
    Filter(String),
    Select(String),
    WalletCreate(String),
    WalletDelete,
    WalletRename(String),
    WalletSend { to: String, amount: f64 },
    WalletImport(PathBuf),
    WalletExport(PathBuf),
    MineStart,
    MineStop,
    BegStart(Option<String>),
    BegStop,
    RegistryOpen,
    RegistryClose,
    Nat,
    Logs(PeerKey),
    LogsClose,
    PeerDelete(PeerKey),
    Reset,
    RpcShow,
    RpcSet(RpcConfig),
    Integrity,
    Metrics,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
commands:
  connect [host[:port]]      seed <value>        filter <text>
  select <address>           nat                 metrics
  wallet create <name> | delete | rename <name> | send <to> <amount>
  wallet import <file> | export <file>
  mine start|stop            beg start [address] | beg stop
  registry open|close        logs <ip:port> | logs close
  peer delete <ip:port>      reset               integrity
  rpc show | rpc set <user> <password> <on|off>
  help                       quit";

pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let joined = rest.join(" ");

    let command = match (head, rest.as_slice()) {
        ("connect", []) => Command::Connect(None),
        ("connect", [target]) => Command::Connect(Some(target.to_string())),
        ("connect", _) => return Err(CommandError::Usage("connect [host[:port]]")),
        ("seed", _) => Command::Seed(joined),
        ("filter", _) => Command::Filter(joined),
        ("select", [address]) => Command::Select(address.to_string()),
        ("select", _) => return Err(CommandError::Usage("select <address>")),
        ("wallet", ["create", ..]) if rest.len() > 1 => Command::WalletCreate(rest[1..].join(" ")),
        ("wallet", ["delete"]) => Command::WalletDelete,
        ("wallet", ["rename", ..]) if rest.len() > 1 => Command::WalletRename(rest[1..].join(" ")),
        ("wallet", ["send", to, amount]) => {
            let amount = amount
                .parse::<f64>()
                .map_err(|_| CommandError::Usage("wallet send <to> <amount>"))?;
            Command::WalletSend {
                to: to.to_string(),
                amount,
            }
        }
        ("wallet", ["import", path]) => Command::WalletImport(PathBuf::from(path)),
        ("wallet", ["export", path]) => Command::WalletExport(PathBuf::from(path)),
        ("wallet", _) => {
            return Err(CommandError::Usage(
                "wallet create <name>|delete|rename <name>|send <to> <amount>|import <file>|export <file>",
            ))
        }
        ("mine", ["start"]) => Command::MineStart,
        ("mine", ["stop"]) => Command::MineStop,
        ("mine", _) => return Err(CommandError::Usage("mine start|stop")),
        ("beg", ["start"]) => Command::BegStart(None),
        ("beg", ["start", address]) => Command::BegStart(Some(address.to_string())),
        ("beg", ["stop"]) => Command::BegStop,
        ("beg", _) => return Err(CommandError::Usage("beg start [address]|stop")),
        ("registry", ["open"]) => Command::RegistryOpen,
        ("registry", ["close"]) => Command::RegistryClose,
        ("registry", _) => return Err(CommandError::Usage("registry open|close")),
        ("nat", []) => Command::Nat,
        ("logs", ["close"]) => Command::LogsClose,
        ("logs", [key]) => Command::Logs(
            key.parse()
                .map_err(|_| CommandError::Usage("logs <ip:port>"))?,
        ),
        ("logs", _) => return Err(CommandError::Usage("logs <ip:port>|close")),
        ("peer", ["delete", key]) => Command::PeerDelete(
            key.parse()
                .map_err(|_| CommandError::Usage("peer delete <ip:port>"))?,
        ),
        ("peer", _) => return Err(CommandError::Usage("peer delete <ip:port>")),
        ("reset", []) => Command::Reset,
        ("rpc", ["show"]) => Command::RpcShow,
        ("rpc", ["set", user, password, enforce]) => Command::RpcSet(RpcConfig {
            user: user.to_string(),
            password: password.to_string(),
            enforce_auth: matches!(*enforce, "on" | "true" | "yes"),
        }),
        ("rpc", _) => return Err(CommandError::Usage("rpc show|set <user> <password> <on|off>")),
        ("integrity", []) => Command::Integrity,
        ("metrics", []) => Command::Metrics,
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// What the input loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Text to show once, outside the dashboard view
    Message(String),
    Quit,
}

/// Run one command against the dashboard
///
/// Action failures are already shown as notices in the view; here they only
/// become a one-line message.
pub async fn execute(dashboard: &Dashboard, command: Command) -> Flow {
    match run(dashboard, command).await {
        Ok(flow) => flow,
        Err(e) => Flow::Message(format!("error: {:#}", e)),
    }
}

async fn run(dashboard: &Dashboard, command: Command) -> anyhow::Result<Flow> {
    use anyhow::Context;

    match command {
        Command::Connect(target) => {
            dashboard.connect(target.as_deref()).await?;
        }
        Command::Seed(value) => dashboard.set_seed(&value).await,
        Command::Filter(value) => dashboard.set_filter(&value).await,
        Command::Select(address) => dashboard.select_wallet(&address).await?,
        Command::WalletCreate(name) => {
            if let Some(address) = dashboard.create_wallet(&name).await? {
                return Ok(Flow::Message(format!("created {}", address)));
            }
        }
        Command::WalletDelete => {
            dashboard.delete_selected_wallet().await?;
        }
        Command::WalletRename(name) => dashboard.rename_selected_wallet(&name).await?,
        Command::WalletSend { to, amount } => {
            dashboard.send(&to, amount).await?;
        }
        Command::WalletImport(path) => {
            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            dashboard.import_wallets(&document).await?;
        }
        Command::WalletExport(path) => {
            let document = dashboard.export_wallets().await?;
            let pretty = serde_json::to_string_pretty(&document)?;
            std::fs::write(&path, pretty)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            return Ok(Flow::Message(format!("exported to {}", path.display())));
        }
        Command::MineStart => dashboard.start_mining().await?,
        Command::MineStop => dashboard.stop_mining().await?,
        Command::BegStart(address) => dashboard.start_beg(address.as_deref()).await?,
        Command::BegStop => dashboard.stop_beg().await?,
        Command::RegistryOpen => dashboard.open_registry().await,
        Command::RegistryClose => dashboard.close_registry().await,
        Command::Nat => {
            dashboard.nat_test().await?;
        }
        Command::Logs(key) => {
            dashboard.show_peer_logs(&key).await?;
        }
        Command::LogsClose => dashboard.close_peer_logs().await,
        Command::PeerDelete(key) => dashboard.delete_peer(&key).await?,
        Command::Reset => dashboard.reset_node().await?,
        Command::RpcShow => {
            dashboard.load_rpc_config().await?;
        }
        Command::RpcSet(config) => dashboard.save_rpc_config(config).await?,
        Command::Integrity => {
            dashboard.integrity_check().await?;
        }
        Command::Metrics => {
            let metrics = serde_json::to_string_pretty(&dashboard.metrics())?;
            return Ok(Flow::Message(metrics));
        }
        Command::Help => return Ok(Flow::Message(HELP.to_string())),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Runs commands one at a time on its own task
///
/// The input loop hands commands over and keeps applying render events
/// while an action is waiting on the node, so in-flight state such as a
/// pending connect is drawn. Commands still run in the order they were typed.
pub struct CommandWorker {
    commands: mpsc::Sender<Command>,
    flows: mpsc::Receiver<Flow>,
}

impl CommandWorker {
    pub fn spawn(dashboard: Arc<Dashboard>) -> Self {
        let (commands, mut queue) = mpsc::channel::<Command>(16);
        let (results, flows) = mpsc::channel(16);

        tokio::spawn(async move {
            while let Some(command) = queue.recv().await {
                let flow = execute(&dashboard, command).await;
                if results.send(flow).await.is_err() {
                    break;
                }
            }
        });

        Self { commands, flows }
    }

    /// Queue a command. Returns false once the worker has stopped.
    pub async fn submit(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Outcome of the next finished command, in submission order
    pub async fn next_flow(&mut self) -> Option<Flow> {
        self.flows.recv().await
    }
}

/// Writes views, skipping any view equal to the last one written
pub struct ConsoleRenderer<W: Write> {
    out: W,
    last: Option<DashboardView>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Returns true when the view was written
    pub fn apply(&mut self, view: DashboardView) -> std::io::Result<bool> {
        if self.last.as_ref() == Some(&view) {
            return Ok(false);
        }
        self.out.write_all(format_view(&view).as_bytes())?;
        self.out.flush()?;
        self.last = Some(view);
        Ok(true)
    }

    pub fn message(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn format_view(view: &DashboardView) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line("================ iCSI NODE ================".to_string());
    line(format!(
        "UPLINK {}   peers {}   height {}",
        view.uplink.label(),
        view.peer_count,
        view.height.map(|h| h.to_string()).unwrap_or_else(|| "-".into())
    ));
    line(format!("discovery: {}", view.discovery.label));
    line(format!(
        "seed [{}]  {}{}",
        view.connect.seed,
        view.connect.label,
        if view.connect.enabled { "" } else { " (busy)" }
    ));
    for attempt in &view.attempts {
        line(format!("  attempt {} {:?}", attempt.target, attempt.phase));
    }

    if let Some(stats) = &view.stats {
        line(format!(
            "difficulty {}   reward {}   halving in {}{}",
            stats.difficulty,
            stats.reward,
            stats.halving,
            stats
                .hashrate
                .as_ref()
                .map(|h| format!("   hashrate {}", h))
                .unwrap_or_default()
        ));
    }

    if view.filter.is_empty() {
        line("-- peers --".to_string());
    } else {
        line(format!("-- peers (filter: {}) --", view.filter));
    }
    for peer in &view.peers {
        line(format!(
            "  {:<22} {:<16}{}",
            peer.key,
            peer.status,
            if peer.can_delete { " [x]" } else { "" }
        ));
    }

    line("-- wallets --".to_string());
    for option in &view.wallets.options {
        let marker = if option.selected { '>' } else { ' ' };
        line(format!(" {} {}", marker, option.label));
    }
    line(format!(
        "  balance {}   address {}",
        view.wallets.balance, view.wallets.address
    ));

    line(format!(
        "-- miner -- start:{} stop:{}",
        on_off(view.miner.start_enabled),
        on_off(view.miner.stop_enabled)
    ));
    for log in &view.miner.terminal {
        line(format!("  | {}", log));
    }

    match &view.beg {
        BegPanel::Active { address, countdown } => {
            line(format!("-- beg -- active {} ({})", address, countdown))
        }
        BegPanel::Start { options } => line(format!("-- beg -- idle, {} wallet(s)", options.len())),
    }

    if let Some(registry) = &view.registry {
        line("-- beggar registry --".to_string());
        if let Some(message) = &registry.empty_message {
            line(format!("  {}", message));
        }
        for row in &registry.rows {
            line(format!("  {}  {}  {}", row.short_address, row.balance, row.seen));
        }
    }

    if let Some(logs) = &view.peer_logs {
        line(format!("-- {} (blocks: {}) --", logs.title, logs.block_count));
        line(logs.content.clone());
    }

    if let Some(rpc) = &view.rpc {
        line(format!(
            "rpc user {} password {} auth {}",
            rpc.user,
            if rpc.password_set { "set" } else { "unset" },
            on_off(rpc.enforce_auth)
        ));
    }
    if let Some(integrity) = &view.integrity {
        line(integrity.summary.clone());
    }

    for notice in &view.notices {
        let prefix = if notice.is_error { "!" } else { "*" };
        line(format!("{} {:?}: {}", prefix, notice.slot, notice.text));
    }

    out
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::view::{render, RenderOptions};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(
            parse_command("connect 10.0.0.1:9341").unwrap(),
            Some(Command::Connect(Some("10.0.0.1:9341".to_string())))
        );
        assert_eq!(
            parse_command("wallet send ICSIabc 1.5").unwrap(),
            Some(Command::WalletSend {
                to: "ICSIabc".to_string(),
                amount: 1.5
            })
        );
        assert_eq!(
            parse_command("wallet create cold storage").unwrap(),
            Some(Command::WalletCreate("cold storage".to_string()))
        );
        assert_eq!(
            parse_command("peer delete 10.0.0.1:9341").unwrap(),
            Some(Command::PeerDelete(PeerKey::new("10.0.0.1", 9341)))
        );
        assert_eq!(
            parse_command("rpc set admin secret on").unwrap(),
            Some(Command::RpcSet(RpcConfig {
                user: "admin".to_string(),
                password: "secret".to_string(),
                enforce_auth: true,
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("fly").unwrap_err(),
            CommandError::Unknown("fly".to_string())
        );
        assert!(matches!(
            parse_command("wallet send x lots"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(parse_command("logs 10.0.0.1"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_renderer_skips_identical_views() {
        let state = AppState::default();
        let view = render(&state, 0, &RenderOptions::default());
        let mut renderer = ConsoleRenderer::new(Vec::new());

        assert!(renderer.apply(view.clone()).unwrap());
        assert!(!renderer.apply(view.clone()).unwrap());

        let mut changed = view;
        changed.filter = "10.0".to_string();
        assert!(renderer.apply(changed).unwrap());

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output.matches("UPLINK OFFLINE").count(), 2);
        assert!(output.contains("filter: 10.0"));
    }

    #[tokio::test]
    async fn test_worker_runs_commands_in_order() {
        let dashboard = Arc::new(Dashboard::new(crate::Config::default()).unwrap());
        let mut worker = CommandWorker::spawn(dashboard.clone());

        assert!(worker.submit(Command::Seed("10.0.0.7".to_string())).await);
        assert!(worker.submit(Command::Help).await);

        assert_eq!(worker.next_flow().await, Some(Flow::Continue));
        assert_eq!(worker.next_flow().await, Some(Flow::Message(HELP.to_string())));
        assert_eq!(dashboard.render().await.connect.seed, "10.0.0.7");
    }
}
