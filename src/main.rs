use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lingua_offline::infrastructure::connectivity::ManualConnectivity;
use lingua_offline::{AppConfig, AppState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lingua-offline")]
#[command(about = "Inspect and maintain the lingua offline cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database URL (defaults to the per-user data directory)
    #[arg(long, env = "LINGUA_DATABASE_URL")]
    database_url: Option<String>,

    /// Base URL of the remote data API
    #[arg(long, env = "LINGUA_API_URL")]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cache statistics and combined usage
    Stats,
    /// List cached scenarios, least recently used first
    List,
    /// Remove scenarios not touched for the given number of days
    Prune {
        #[arg(long)]
        max_age_days: Option<u64>,
    },
    /// Clear every cached scenario, exercise and response cache
    Clear,
    /// Check connectivity and run one sync pass
    Sync,
    /// Show queued operations
    Queue,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    lingua_offline::init_logging(&cli.log_level, cli.json_logs);

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(url) = cli.api_url {
        config.remote.api_url = url.trim_end_matches('/').to_string();
    }

    // The CLI has no platform signal; the probe decides.
    let platform = Arc::new(ManualConnectivity::new(true));
    let state = AppState::initialize(config, platform)
        .await
        .context("failed to open offline store")?;

    let outcome = run(&state, cli.command).await;
    state.shutdown().await;
    state.pool.close().await;
    outcome
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Stats => {
            let statistics = state.cache.get_statistics().await?;
            let usage = state.cache.combined_usage().await?;
            print_json(&serde_json::json!({
                "statistics": statistics,
                "usage": usage,
            }))?;
        }
        Commands::List => {
            print_json(&state.storage.list_scenario_metadata().await)?;
        }
        Commands::Prune { max_age_days } => {
            let days = max_age_days.unwrap_or(state.config.storage.default_max_age_days);
            let removed = state
                .cache
                .prune_older_than(Duration::from_secs(days * 24 * 60 * 60))
                .await?;
            info!(removed, days, "prune finished");
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
        Commands::Clear => {
            print_json(&state.cache.clear_all_caches().await?)?;
        }
        Commands::Sync => {
            if !state.monitor.check_connectivity().await {
                warn!("remote unreachable; queue left untouched");
            }
            let report = state.sync.drain().await?;
            print_json(&serde_json::json!({
                "report": report,
                "status": state.sync.status(),
            }))?;
        }
        Commands::Queue => {
            let store = state.storage.store();
            print_json(&store.list_operations().await?)?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
