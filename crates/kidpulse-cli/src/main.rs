//! KidPulse: extract childcare events from captured feed pages and keep a
//! per-date record for each child.

use std::path::PathBuf;

use anyhow::Context;
use kidpulse_core::KidPulseConfig;
use kidpulse_runtime::{FileFeedSource, Orchestrator};
use kidpulse_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Command;

fn resolve_data_dir() -> PathBuf {
    std::env::var("KIDPULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match commands::parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };
    if command == Command::Help {
        commands::print_help();
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = KidPulseConfig::from_env(&data_dir)?;

    match command {
        Command::Ingest { file, child, date } => {
            let orchestrator = Orchestrator::from_config(config)
                .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;
            let now = orchestrator.config().reference_now();
            let reference = date.map(|d| d.and_time(now.time())).unwrap_or(now);

            let source = FileFeedSource::new(&file, child);
            let report = orchestrator
                .run_cycle_at(&source, reference)
                .await
                .with_context(|| format!("Ingest of {} failed", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Show { date } => {
            let store = SqliteStore::open(&config.data_paths.db_dir)?;
            match commands::show_json(&store, date)? {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => {
                    eprintln!("No data for {}", date);
                    std::process::exit(1);
                }
            }
        }
        Command::History { limit } => {
            let store = SqliteStore::open(&config.data_paths.db_dir)?;
            for line in commands::history_lines(&store, limit)? {
                println!("{}", line);
            }
        }
        Command::Log { limit } => {
            let store = SqliteStore::open(&config.data_paths.db_dir)?;
            for line in commands::log_lines(&store, limit)? {
                println!("{}", line);
            }
        }
        Command::Help => {}
    }

    Ok(())
}
