//! Wagerline — sports-betting backend, bet placement core.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the entity store, and serves the bet API until interrupted.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use wagerline::api::{build_router, AppState};
use wagerline::config::{AppConfig, StoreDriver};
use wagerline::engine::{BetPlacementEngine, BetPolicy};
use wagerline::store::{EntityStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();

    info!(
        port = cfg.server.port,
        driver = ?cfg.store.driver,
        allow_duplicate_bets = cfg.betting.allow_duplicate_bets,
        "Wagerline starting up"
    );

    let store: Arc<dyn EntityStore> = match cfg.store.driver {
        StoreDriver::Memory => Arc::new(MemoryStore::new()),
        StoreDriver::Sqlite => Arc::new(
            SqliteStore::connect(&cfg.store.database_url, cfg.store.max_connections)
                .await
                .context("Failed to open SQLite store")?,
        ),
    };

    let engine = BetPlacementEngine::new(
        store.clone(),
        BetPolicy {
            allow_duplicate_bets: cfg.betting.allow_duplicate_bets,
        },
    );
    let state = Arc::new(AppState { engine, store });
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wagerline=info"));

    let json_logging = std::env::var("WAGERLINE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
