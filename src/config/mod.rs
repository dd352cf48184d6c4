//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides via `.env` files.
//! Feed credentials, windows and scoring weights are externalized
//! here - nothing tunable is hardcoded in the domain layer.

pub mod loader;

use serde::Deserialize;

use crate::domain::ranking::{RankingWindows, ScoringWeights};

/// Top-level service configuration.
///
/// Loaded once at startup. All fields are validated before any
/// task is spawned.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// HTTP query surface.
  #[serde(default)]
  pub server: ServerConfig,
  /// External trade feed.
  #[serde(default)]
  pub feed: FeedConfig,
  /// Ledger retention.
  #[serde(default)]
  pub ledger: LedgerConfig,
  /// Leaderboard windows and weights.
  #[serde(default)]
  pub ranking: RankingConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Interface to bind.
  #[serde(default = "default_bind_host")]
  pub bind_host: String,
  /// Listen port (`PORT` env var overrides).
  #[serde(default = "default_port")]
  pub port: u16,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Trade feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// GraphQL endpoint URL.
  #[serde(default = "default_feed_url")]
  pub url: String,
  /// Bearer token (`BITQUERY_API_KEY` env var overrides). Keep it out of git.
  #[serde(default)]
  pub api_key: String,
  /// Interval between fetches (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
  /// Trades requested per fetch.
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  /// Request timeout (milliseconds).
  #[serde(default = "default_timeout")]
  pub timeout_ms: u64,
  /// Accepted protocol names, compared case-insensitively.
  #[serde(default = "default_protocols")]
  pub allowed_protocols: Vec<String>,
}

/// Ledger retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
  /// Retention window (seconds).
  #[serde(default = "default_retention")]
  pub retention_secs: u64,
  /// Full sweep interval (seconds). 0 disables the sweep.
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
}

/// Ranking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
  /// Entries per leaderboard.
  #[serde(default = "default_limit")]
  pub limit: usize,
  /// Short window (seconds): trending 1m figures and surge buckets.
  #[serde(default = "default_short_window")]
  pub short_window_secs: u64,
  /// Trending window (seconds): 5m volume and price change.
  #[serde(default = "default_trend_window")]
  pub trend_window_secs: u64,
  /// Trending score weights.
  #[serde(default)]
  pub weights: ScoringWeights,
}

impl RankingConfig {
  /// Windows in the millisecond form the ranking engine expects.
  pub fn windows(&self) -> RankingWindows {
    RankingWindows {
      short_ms: secs_to_ms(self.short_window_secs),
      trend_ms: secs_to_ms(self.trend_window_secs),
    }
  }
}

impl LedgerConfig {
  /// Retention window in milliseconds.
  pub fn retention_ms(&self) -> i64 {
    secs_to_ms(self.retention_secs)
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

fn secs_to_ms(secs: u64) -> i64 {
  i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_host: default_bind_host(),
      port: default_port(),
      log_level: default_log_level(),
    }
  }
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      url: default_feed_url(),
      api_key: String::new(),
      poll_interval_ms: default_poll_interval(),
      batch_size: default_batch_size(),
      timeout_ms: default_timeout(),
      allowed_protocols: default_protocols(),
    }
  }
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      retention_secs: default_retention(),
      sweep_interval_secs: default_sweep_interval(),
    }
  }
}

impl Default for RankingConfig {
  fn default() -> Self {
    Self {
      limit: default_limit(),
      short_window_secs: default_short_window(),
      trend_window_secs: default_trend_window(),
      weights: ScoringWeights::default(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_bind_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  3000
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_feed_url() -> String {
  "https://streaming.bitquery.io/eap".to_string()
}

fn default_poll_interval() -> u64 {
  4000
}

fn default_batch_size() -> usize {
  100
}

fn default_timeout() -> u64 {
  10_000
}

fn default_protocols() -> Vec<String> {
  vec![
    "pump".to_string(),
    "pump_amm".to_string(),
    "pumpswap".to_string(),
  ]
}

fn default_retention() -> u64 {
  600 // 10 minutes
}

fn default_sweep_interval() -> u64 {
  60
}

fn default_limit() -> usize {
  10
}

fn default_short_window() -> u64 {
  60
}

fn default_trend_window() -> u64 {
  300
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
