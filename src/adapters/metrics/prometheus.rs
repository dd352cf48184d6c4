//! Prometheus Metrics Registry - Ingestion and Query Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers feed latency, ingestion outcomes, ledger size and
//! leaderboard request counts.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the terminal.
///
/// All metrics follow the naming convention `pump_terminal_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Feed round-trip latency histogram (milliseconds).
    pub feed_latency_ms: Histogram,
    /// Ingestion cycles by outcome (`ok`, or the feed error kind).
    pub ingest_cycles: IntCounterVec,
    /// Trades appended to the ledger.
    pub trades_ingested: IntCounter,
    /// Feed records not ingested, by reason.
    pub records_skipped: IntCounterVec,
    /// Distinct tokens tracked by the ledger.
    pub tracked_tokens: IntGauge,
    /// Trades currently retained across all tokens.
    pub retained_trades: IntGauge,
    /// Trades dropped by periodic sweeps.
    pub swept_trades: IntCounter,
    /// Leaderboard requests by view.
    pub ranking_requests: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let feed_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "pump_terminal_feed_latency_ms",
                "Trade feed round-trip latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0,
            ]),
        )?;

        let ingest_cycles = IntCounterVec::new(
            Opts::new(
                "pump_terminal_ingest_cycles_total",
                "Ingestion cycles by outcome",
            ),
            &["outcome"],
        )?;

        let trades_ingested = IntCounter::new(
            "pump_terminal_trades_ingested_total",
            "Trades appended to the ledger",
        )?;

        let records_skipped = IntCounterVec::new(
            Opts::new(
                "pump_terminal_records_skipped_total",
                "Feed records not ingested, by reason",
            ),
            &["reason"],
        )?;

        let tracked_tokens = IntGauge::new(
            "pump_terminal_tracked_tokens",
            "Distinct tokens tracked by the ledger",
        )?;

        let retained_trades = IntGauge::new(
            "pump_terminal_retained_trades",
            "Trades retained across all tokens",
        )?;

        let swept_trades = IntCounter::new(
            "pump_terminal_swept_trades_total",
            "Trades dropped by periodic ledger sweeps",
        )?;

        let ranking_requests = IntCounterVec::new(
            Opts::new(
                "pump_terminal_ranking_requests_total",
                "Leaderboard requests by view",
            ),
            &["view"],
        )?;

        // Register all metrics
        registry.register(Box::new(feed_latency_ms.clone()))?;
        registry.register(Box::new(ingest_cycles.clone()))?;
        registry.register(Box::new(trades_ingested.clone()))?;
        registry.register(Box::new(records_skipped.clone()))?;
        registry.register(Box::new(tracked_tokens.clone()))?;
        registry.register(Box::new(retained_trades.clone()))?;
        registry.register(Box::new(swept_trades.clone()))?;
        registry.register(Box::new(ranking_requests.clone()))?;

        Ok(Self {
            registry,
            feed_latency_ms,
            ingest_cycles,
            trades_ingested,
            records_skipped,
            tracked_tokens,
            retained_trades,
            swept_trades,
            ranking_requests,
        })
    }

    /// Record the ledger's current size.
    pub fn observe_ledger(&self, tokens: usize, trades: usize) {
        self.tracked_tokens
            .set(i64::try_from(tokens).unwrap_or(i64::MAX));
        self.retained_trades
            .set(i64::try_from(trades).unwrap_or(i64::MAX));
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
