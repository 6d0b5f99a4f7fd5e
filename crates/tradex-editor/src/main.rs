//! Tradex strategy canvas editor - Entry Point
//!
//! Replays an edit session against the graph API and prints a JSON report.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tradex_editor::config::CONFIG_ENV;
use tradex_editor::{AppConfig, EditorSession, SessionScript};
use tradex_graph::{DynGraphMutation, MockGraphApi, RestGraphClient};
use tradex_telemetry::Metrics;

/// Tradex strategy canvas editor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRADEX_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Session script (JSON list of commands)
    #[arg(short, long)]
    session: String,

    /// Run against an in-memory graph instead of the REST API
    #[arg(long)]
    dry_run: bool,

    /// Print Prometheus metrics after the report
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the log level
    let config = match args.config.or_else(|| std::env::var(CONFIG_ENV).ok()) {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::load()?,
    };

    tradex_telemetry::init_logging(Some(&config.telemetry.log_level))?;

    info!("Starting tradex-editor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        strategy_id = %config.strategy_id,
        base_url = %config.api.base_url,
        max_depth = config.history.max_depth,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let api: DynGraphMutation = if args.dry_run {
        Arc::new(MockGraphApi::new())
    } else {
        Arc::new(RestGraphClient::new(config.client_config())?)
    };

    let script = SessionScript::from_file(&args.session)?;
    let mut session = EditorSession::new(config.strategy(), api, &config.history);
    let report = session.run(&script).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.metrics {
        print!("{}", Metrics::gather_text()?);
    }

    info!(
        undo_depth = report.undo_depth,
        redo_depth = report.redo_depth,
        "Session complete"
    );
    Ok(())
}
