//! Lobby composer (vgmq-lobby) - Main entry point
//!
//! Composes a round for a lobby stored in the VGMQ database and prints the
//! resulting playlist as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use vgmq_common::config::{locate_config_file, resolve_database_path, DATABASE_ENV_VAR};
use vgmq_common::db::init_database;
use vgmq_common::events::EventBus;
use vgmq_lobby::{
    ComposerConfig, LobbyMusicLoader, SqliteCatalog, SqliteJobQueue, SqliteLobbyStore,
};

/// Command-line arguments for vgmq-lobby
#[derive(Parser, Debug)]
#[command(name = "vgmq-lobby")]
#[command(about = "Round composer for VGMQ lobbies")]
#[command(version)]
struct Args {
    /// Database file (falls back to VGMQ_DATABASE, then the config file)
    #[arg(short, long)]
    database: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "VGMQ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose, save and start a lobby round
    Compose {
        /// Lobby UUID
        #[arg(short, long)]
        lobby: Uuid,

        /// Seed for a reproducible playlist
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(|| locate_config_file().ok());
    let config = ComposerConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db_path = resolve_database_path(args.database.as_deref(), DATABASE_ENV_VAR);
    info!("Database: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let events = Arc::new(EventBus::new(config.event_capacity));
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            debug!(lobby_id = %event.lobby_id(), event = event.event_type(), "Event");
        }
    });

    match args.command {
        Command::Compose { lobby, seed } => {
            let mut loader = LobbyMusicLoader::new(
                Arc::new(SqliteCatalog::new(pool.clone())),
                Arc::new(SqliteLobbyStore::new(pool.clone())),
                Arc::new(SqliteJobQueue::new(pool.clone())),
                Arc::clone(&events),
                config.composition.clone(),
            );
            if let Some(seed) = seed {
                loader = loader.with_seed(seed);
            }

            let outcome = loader
                .load(lobby)
                .await
                .with_context(|| format!("Failed to load music for lobby {}", lobby))?;

            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialize playlist")?
            );
        }
    }

    pool.close().await;
    Ok(())
}
