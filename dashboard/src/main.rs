use std::sync::Arc;

use anyhow::{Context, Result};
use icsi_dashboard::console::{self, Command, CommandWorker, ConsoleRenderer, Flow};
use icsi_dashboard::{logging, Config, Dashboard};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// Config base name; `ICSI_DASHBOARD_CONFIG` overrides it
const DEFAULT_CONFIG_BASE: &str = "config";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_base =
        std::env::var("ICSI_DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_BASE.to_string());
    let config = Config::from_file(&config_base)
        .with_context(|| format!("Failed to load configuration from {}", config_base))?;

    let _log_guard = logging::init(&config.logging);
    tracing::info!(node = %config.node.base_url, "Starting iCSI dashboard");

    let dashboard = Arc::new(Dashboard::new(config).context("Failed to create dashboard")?);
    let mut events = dashboard.subscribe();
    let mut worker = CommandWorker::spawn(dashboard.clone());
    let mut renderer = ConsoleRenderer::new(std::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    dashboard.start().await;
    renderer.apply(dashboard.render().await)?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Render events lagged");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match console::parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        if !worker.submit(command).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => renderer.message(&e.to_string())?,
                }
            }
            flow = worker.next_flow() => match flow {
                Some(Flow::Continue) => {}
                Some(Flow::Message(text)) => renderer.message(&text)?,
                Some(Flow::Quit) | None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }

        renderer.apply(dashboard.render().await)?;
    }

    dashboard.shutdown().await;
    tracing::info!("Dashboard stopped");
    Ok(())
}
