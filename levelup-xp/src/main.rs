//! levelup-xp - XP/progression coordinator for Level Up Live
//!
//! Serves the dashboard API and the SSE notification stream consumed by the
//! stage page.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use levelup_common::config::{default_config_path, RootFolderInitializer, TomlConfig};
use levelup_common::db::init_database;
use levelup_common::events::EventBus;
use levelup_xp::api::{self, AppContext};
use levelup_xp::config::{CliOverrides, ServiceConfig};
use levelup_xp::coordinator::COMBO_SWEEP_INTERVAL;
use levelup_xp::db::{seed_default_levels, SqliteLevelCatalog, SqliteSessionCatalog};
use levelup_xp::session::SessionController;
use levelup_xp::{NotificationBridge, XpCoordinator};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Event bus capacity; slow SSE clients lag beyond this
const EVENT_BUS_CAPACITY: usize = 1000;

/// Command-line arguments for levelup-xp
#[derive(Parser, Debug)]
#[command(name = "levelup-xp")]
#[command(about = "XP/progression coordinator for Level Up Live")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "LEVELUP_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long, env = "LEVELUP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Database file (defaults to <root>/levelup.db)
    #[arg(long, env = "LEVELUP_DATABASE")]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "LEVELUP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not seed starter levels into an empty catalog
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path("levelup-xp"));
    let toml = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    let config = ServiceConfig::resolve(
        CliOverrides {
            port: args.port,
            root_folder: args.root_folder.clone(),
            database: args.database.clone(),
            log_level: args.log_level.clone(),
        },
        toml,
    );

    init_tracing(&config)?;

    info!(
        "Starting Level Up Live XP coordinator (levelup-xp) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }
    info!("Root folder: {}", config.root_folder.display());

    RootFolderInitializer::new(config.root_folder.clone())
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    if !args.no_seed {
        seed_default_levels(&pool)
            .await
            .context("Failed to seed starter levels")?;
    }

    // Wire collaborators
    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let levels = Arc::new(SqliteLevelCatalog::new(pool.clone()));
    let sessions = SessionController::new(Arc::new(SqliteSessionCatalog::new(pool.clone())));
    let bridge = NotificationBridge::new(events.clone(), levels.clone(), Arc::new(events));
    let coordinator = Arc::new(XpCoordinator::new(config.xp, levels, sessions, bridge));

    // Thresholds must be in place before the first trigger is served
    let thresholds = coordinator
        .load_thresholds()
        .await
        .context("Failed to load level thresholds")?;
    if thresholds.level_count == 0 {
        warn!("No levels defined; XP will accumulate without levelling up");
    }

    let sweep = coordinator.spawn_combo_sweep(COMBO_SWEEP_INTERVAL);

    let app = api::create_router(AppContext {
        coordinator: coordinator.clone(),
        port: config.port,
        root_folder: config.root_folder.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweep.abort();

    if coordinator.is_live().await {
        match coordinator.end_live().await {
            Ok(session) => info!("Closed live session {} on shutdown", session.id),
            Err(e) => error!("Failed to close live session on shutdown: {}", e),
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ServiceConfig) -> Result<()> {
    let level = &config.log_level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "levelup_xp={level},levelup_common={level},tower_http={level}",
            level = level
        )
        .into()
    });

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
