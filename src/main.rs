//! Pump Trend Terminal - Entry Point
//!
//! Polls recent Solana DEX trades, keeps a rolling window per pump.fun
//! token, and serves volume / trending / surge leaderboards over HTTP.
//! Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load .env, then config.toml + env overrides + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create the shared token ledger and ranking engine
//! 4. Create BitqueryFeed (implements TradeFeed port)
//! 5. Spawn trade ingestor (first fetch immediately, then every tick)
//! 6. Spawn ledger sweeper (unless disabled)
//! 7. Spawn Prometheus metrics server (unless disabled)
//! 8. Spawn query server (/top-meme, /top-trending, /top-surge, /live, /ready)
//! 9. Wait for SIGINT → broadcast shutdown → drain tasks

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use pump_trend_terminal::adapters::api::{self, ApiState};
use pump_trend_terminal::adapters::feeds::{BitqueryConfig, BitqueryFeed};
use pump_trend_terminal::adapters::metrics::{HealthState, MetricsRegistry};
use pump_trend_terminal::config;
use pump_trend_terminal::domain::{RankingEngine, TokenLedger};
use pump_trend_terminal::usecases::{shared_ledger, LedgerSweeper, TradeIngestor};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    // A missing .env is fine; the variables may come from the process.
    let _ = dotenv::dotenv();
    let config_path = std::env::var("PUMP_TERMINAL_CONFIG")
        .unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.server.log_level)
                }),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        protocols = ?config.feed.allowed_protocols,
        "Starting Pump Trend Terminal"
    );

    // ── 3. Shared state ─────────────────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let ledger = shared_ledger(TokenLedger::new(config.ledger.retention_ms()));
    let engine = RankingEngine::new(
        config.ranking.weights,
        config.ranking.windows(),
        config.ranking.limit,
    );
    let metrics = Arc::new(
        MetricsRegistry::new().context("Failed to register Prometheus metrics")?,
    );
    let health = Arc::new(HealthState::new());

    // ── 4. Create trade feed (TradeFeed port) ───────────────
    let feed = Arc::new(
        BitqueryFeed::new(BitqueryConfig {
            url: config.feed.url.clone(),
            api_key: config.feed.api_key.clone(),
            timeout: Duration::from_millis(config.feed.timeout_ms),
        })
        .context("Failed to create Bitquery client")?,
    );

    let mut handles = Vec::new();

    // ── 5. Spawn trade ingestor ─────────────────────────────
    let ingestor = TradeIngestor::new(
        feed,
        Arc::clone(&ledger),
        &config.feed,
        Arc::clone(&metrics),
        Arc::clone(&health),
    );
    let ingest_shutdown = shutdown_tx.subscribe();
    handles.push(tokio::spawn(async move {
        ingestor.run(ingest_shutdown).await;
    }));

    // ── 6. Spawn ledger sweeper ─────────────────────────────
    if config.ledger.sweep_interval_secs > 0 {
        let sweeper = LedgerSweeper::new(
            Arc::clone(&ledger),
            Duration::from_secs(config.ledger.sweep_interval_secs),
            Arc::clone(&metrics),
        );
        let sweep_shutdown = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            sweeper.run(sweep_shutdown).await;
        }));
    } else {
        warn!("Ledger sweep disabled: idle tokens keep stale trades until touched");
    }

    // ── 7. Spawn Prometheus metrics server ──────────────────
    if config.metrics.enabled {
        let metrics_ref = Arc::clone(&metrics);
        let bind = config.metrics.bind_address.clone();
        let metrics_shutdown = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = metrics_ref.serve(bind, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }));
    }

    // ── 8. Spawn query server ───────────────────────────────
    let app = api::router(
        ApiState {
            ledger: Arc::clone(&ledger),
            engine,
            metrics: Arc::clone(&metrics),
        },
        Arc::clone(&health),
    );
    let addr = format!("{}:{}", config.server.bind_host, config.server.port);
    let server_shutdown = shutdown_tx.subscribe();
    handles.push(tokio::spawn(async move {
        if let Err(e) = api::serve(app, addr, server_shutdown).await {
            error!(error = %e, "Query server failed");
        }
    }));

    info!(tasks = handles.len(), "All tasks spawned: terminal is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    let _ = shutdown_tx.send(());

    for handle in handles {
        if tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .is_err()
        {
            warn!("Task did not stop within 10s");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
