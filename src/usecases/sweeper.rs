//! Ledger Sweeper - Periodic Retention Enforcement
//!
//! Ingestion only prunes the tokens it touches, so a token that stops
//! trading would keep its last trades forever. The sweeper prunes every
//! record on a fixed interval, independent of feed activity.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::adapters::metrics::MetricsRegistry;

use super::SharedLedger;

/// Periodically prunes the whole ledger.
pub struct LedgerSweeper {
    /// Ledger shared with the ingestor and query surface.
    ledger: SharedLedger,
    /// Delay between sweeps.
    interval: Duration,
    /// Prometheus metrics.
    metrics: Arc<MetricsRegistry>,
}

impl LedgerSweeper {
    /// Create a new sweeper.
    pub fn new(ledger: SharedLedger, interval: Duration, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            ledger,
            interval,
            metrics,
        }
    }

    /// Run the sweep loop until shutdown.
    #[instrument(skip(self, shutdown_rx), name = "sweep_loop")]
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "Ledger sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing to sweep yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Ledger sweeper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.sweep_once(Utc::now()).await;
                }
            }
        }
    }

    /// Prune every record relative to `now`. Returns the trades dropped.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let (dropped, tokens, trades) = {
            let mut ledger = self.ledger.write().await;
            let dropped = ledger.sweep(now);
            (dropped, ledger.token_count(), ledger.trade_count())
        };

        self.metrics.swept_trades.inc_by(dropped as u64);
        self.metrics.observe_ledger(tokens, trades);
        debug!(dropped, tokens, retained = trades, "Ledger swept");

        dropped
    }
}
