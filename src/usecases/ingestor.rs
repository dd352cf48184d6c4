//! Trade Ingestor - Periodic Feed Polling into the Token Ledger
//!
//! On every tick:
//! 1. Fetches the most recent trade batch from the `TradeFeed`
//! 2. Filters records to the protocol allow-list
//! 3. Normalizes them into `Trade` events stamped with the cycle time
//! 4. Applies the whole batch to the ledger under one write guard
//!
//! A failed fetch skips the cycle and leaves the ledger untouched.
//! The next tick is the only retry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::config::FeedConfig;
use crate::domain::trade::{TokenMeta, Trade};
use crate::ports::trade_feed::{FeedError, FeedTrade, TradeFeed};

use super::SharedLedger;

/// Why a feed record was not ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
  /// No protocol name on the record.
  MissingProtocol,
  /// Protocol not in the allow-list.
  ProtocolNotAllowed,
  /// No usable token id on the record.
  MissingToken,
}

impl SkipReason {
  /// Metric label.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MissingProtocol => "missing_protocol",
      Self::ProtocolNotAllowed => "protocol_not_allowed",
      Self::MissingToken => "missing_token",
    }
  }
}

/// A feed record that passed filtering, ready for the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrade {
  /// Mint address.
  pub token_id: String,
  /// Metadata used if the token is new.
  pub meta: TokenMeta,
  /// USD volume, 0 when absent.
  pub volume_usd: f64,
  /// Price, 0 when absent.
  pub price: f64,
}

/// Outcome of one applied batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
  /// Records returned by the feed.
  pub fetched: usize,
  /// Trades appended to the ledger.
  pub accepted: usize,
  /// Records dropped by the protocol filter.
  pub filtered: usize,
  /// Records dropped as unusable.
  pub malformed: usize,
  /// Tokens tracked by the ledger after the batch.
  pub tracked_tokens: usize,
  /// Trades retained by the ledger after the batch.
  pub retained_trades: usize,
}

/// Polls a `TradeFeed` and writes into the shared ledger.
pub struct TradeIngestor<F: TradeFeed> {
  /// Trade data source.
  feed: Arc<F>,
  /// Ledger shared with the query surface.
  ledger: SharedLedger,
  /// Lower-cased protocol allow-list.
  allowed_protocols: HashSet<String>,
  /// Trades requested per fetch.
  batch_size: usize,
  /// Delay between fetches.
  poll_interval: Duration,
  /// Prometheus metrics.
  metrics: Arc<MetricsRegistry>,
  /// Readiness state.
  health: Arc<HealthState>,
}

impl<F: TradeFeed> TradeIngestor<F> {
  /// Create a new ingestor from feed configuration.
  pub fn new(
    feed: Arc<F>,
    ledger: SharedLedger,
    config: &FeedConfig,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
  ) -> Self {
    let allowed_protocols = config
      .allowed_protocols
      .iter()
      .map(|p| p.trim().to_lowercase())
      .collect();

    Self {
      feed,
      ledger,
      allowed_protocols,
      batch_size: config.batch_size,
      poll_interval: Duration::from_millis(config.poll_interval_ms),
      metrics,
      health,
    }
  }

  /// Run the polling loop until shutdown.
  ///
  /// The first fetch happens immediately. Slow fetches delay the next
  /// tick rather than bunching missed ticks together.
  #[instrument(skip(self, shutdown_rx), name = "ingest_loop", fields(feed = self.feed.name()))]
  pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
    info!(
      interval_ms = self.poll_interval.as_millis() as u64,
      batch_size = self.batch_size,
      "Trade ingestor started"
    );

    let mut ticker = tokio::time::interval(self.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Trade ingestor shutting down");
          return;
        }
        _ = ticker.tick() => {
          // Failures are logged and counted by run_cycle; keep polling.
          if let Err(e) = self.run_cycle().await {
            debug!(kind = e.kind(), "Waiting for next tick after failed cycle");
          }
        }
      }
    }
  }

  /// Perform one fetch-and-apply cycle.
  ///
  /// # Errors
  /// Returns the feed error when the round-trip fails; the ledger is
  /// not touched in that case.
  pub async fn run_cycle(&self) -> Result<CycleReport, FeedError> {
    let started = Instant::now();
    let fetched = self.feed.fetch_recent(self.batch_size).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    self.metrics.feed_latency_ms.observe(latency_ms);

    let records = match fetched {
      Ok(records) => records,
      Err(e) => {
        warn!(error = %e, kind = e.kind(), latency_ms, "Feed cycle failed, skipping");
        self
          .metrics
          .ingest_cycles
          .with_label_values(&[e.kind()])
          .inc();
        self.health.mark_feed_failed();
        return Err(e);
      }
    };

    let now = Utc::now();
    let report = self.apply_batch(records, now).await;

    self.metrics.ingest_cycles.with_label_values(&["ok"]).inc();
    self.health.mark_ingested(now.timestamp_millis());

    info!(
      latency_ms,
      fetched = report.fetched,
      accepted = report.accepted,
      filtered = report.filtered,
      malformed = report.malformed,
      tracked_tokens = report.tracked_tokens,
      retained_trades = report.retained_trades,
      "Feed cycle applied"
    );

    Ok(report)
  }

  /// Normalize `records` and append them to the ledger, all stamped `now`.
  ///
  /// Normalization happens before the write guard is taken so readers
  /// are blocked only for the append-and-prune pass.
  pub async fn apply_batch(&self, records: Vec<FeedTrade>, now: DateTime<Utc>) -> CycleReport {
    let mut report = CycleReport {
      fetched: records.len(),
      ..CycleReport::default()
    };

    let mut accepted = Vec::with_capacity(records.len());
    for record in records {
      match self.normalize(record) {
        Ok(trade) => accepted.push(trade),
        Err(reason) => {
          self
            .metrics
            .records_skipped
            .with_label_values(&[reason.as_str()])
            .inc();
          match reason {
            SkipReason::ProtocolNotAllowed => report.filtered += 1,
            SkipReason::MissingProtocol | SkipReason::MissingToken => {
              debug!(reason = reason.as_str(), "Skipping unusable feed record");
              report.malformed += 1;
            }
          }
        }
      }
    }
    report.accepted = accepted.len();

    (report.tracked_tokens, report.retained_trades) = {
      let mut ledger = self.ledger.write().await;
      for trade in accepted {
        ledger.upsert_trade(
          &trade.token_id,
          trade.meta,
          Trade::new(now, trade.volume_usd, trade.price),
          now,
        );
      }
      (ledger.token_count(), ledger.trade_count())
    };

    self.metrics.trades_ingested.inc_by(report.accepted as u64);
    self
      .metrics
      .observe_ledger(report.tracked_tokens, report.retained_trades);

    report
  }

  /// Filter and coerce a single feed record.
  ///
  /// # Errors
  /// Returns the reason the record cannot be ingested.
  pub fn normalize(&self, record: FeedTrade) -> Result<NormalizedTrade, SkipReason> {
    let dex = record
      .protocol
      .map(|p| p.trim().to_lowercase())
      .filter(|p| !p.is_empty())
      .ok_or(SkipReason::MissingProtocol)?;

    if !self.allowed_protocols.contains(&dex) {
      return Err(SkipReason::ProtocolNotAllowed);
    }

    let token_id = record
      .token_id
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .ok_or(SkipReason::MissingToken)?;

    Ok(NormalizedTrade {
      token_id,
      meta: TokenMeta {
        symbol: record.symbol.unwrap_or_default(),
        name: record.name.unwrap_or_default(),
        dex,
      },
      volume_usd: record.volume_usd.unwrap_or(0.0),
      price: record.price.unwrap_or(0.0),
    })
  }
}
