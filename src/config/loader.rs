//! Configuration Loader - File Loading, Env Overrides and Validation
//!
//! Handles loading `config.toml`, applying environment overrides
//! (`PORT`, `BITQUERY_API_KEY`, `BITQUERY_URL`), validating all
//! parameters, and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load, override and validate configuration.
///
/// A missing file is not an error: every section has defaults and the
/// feed credentials usually come from the environment.
///
/// # Errors
/// Returns detailed error if:
/// - The file exists but can't be read
/// - TOML parsing fails
/// - An environment override is malformed
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = if path.exists() {
    std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?
  } else {
    info!(path = %path.display(), "No config file found, using defaults");
    String::new()
  };

  let mut config = parse_config(&content)?;
  apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
  validate_config(&config)?;

  info!(
    port = config.server.port,
    poll_interval_ms = config.feed.poll_interval_ms,
    batch_size = config.feed.batch_size,
    protocols = ?config.feed.allowed_protocols,
    retention_secs = config.ledger.retention_secs,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML content into an `AppConfig` (no overrides, no validation).
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).with_context(|| "Failed to parse config.toml")
}

/// Apply environment overrides using `lookup` to resolve variables.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(port) = lookup("PORT") {
    config.server.port = port
      .trim()
      .parse()
      .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?;
  }
  if let Some(key) = lookup("BITQUERY_API_KEY") {
    config.feed.api_key = key;
  }
  if let Some(url) = lookup("BITQUERY_URL") {
    config.feed.url = url;
  }
  Ok(())
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty feed URL, credentials and allow-list
/// - Positive intervals and sizes
/// - Ranking windows ordered inside the retention window
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Feed validation
  anyhow::ensure!(!config.feed.url.is_empty(), "Feed URL must not be empty");
  anyhow::ensure!(
    !config.feed.api_key.trim().is_empty(),
    "Feed API key is empty - set BITQUERY_API_KEY"
  );
  anyhow::ensure!(
    config.feed.poll_interval_ms > 0,
    "feed.poll_interval_ms must be positive"
  );
  anyhow::ensure!(
    (1..=1000).contains(&config.feed.batch_size),
    "feed.batch_size must be in [1, 1000], got {}",
    config.feed.batch_size
  );
  anyhow::ensure!(config.feed.timeout_ms > 0, "feed.timeout_ms must be positive");
  anyhow::ensure!(
    !config.feed.allowed_protocols.is_empty(),
    "At least one protocol must be allowed"
  );
  for (i, protocol) in config.feed.allowed_protocols.iter().enumerate() {
    anyhow::ensure!(
      !protocol.trim().is_empty(),
      "feed.allowed_protocols[{}] is empty",
      i
    );
  }

  // Ledger validation
  anyhow::ensure!(
    config.ledger.retention_secs > 0,
    "ledger.retention_secs must be positive"
  );

  // Ranking validation
  let ranking = &config.ranking;
  anyhow::ensure!(ranking.limit > 0, "ranking.limit must be at least 1");
  anyhow::ensure!(
    ranking.short_window_secs > 0 && ranking.short_window_secs < ranking.trend_window_secs,
    "ranking windows must satisfy 0 < short ({}) < trend ({})",
    ranking.short_window_secs,
    ranking.trend_window_secs
  );
  anyhow::ensure!(
    ranking.trend_window_secs <= config.ledger.retention_secs,
    "ranking.trend_window_secs ({}) exceeds ledger.retention_secs ({})",
    ranking.trend_window_secs,
    config.ledger.retention_secs
  );
  anyhow::ensure!(
    ranking.short_window_secs.saturating_mul(2) <= config.ledger.retention_secs,
    "surge needs two short windows inside the retention window"
  );
  let w = &ranking.weights;
  anyhow::ensure!(
    [w.vol_1m, w.trades_1m, w.vol_5m, w.price_change]
      .iter()
      .all(|v| v.is_finite()),
    "ranking.weights must be finite numbers"
  );

  // Metrics validation
  if config.metrics.enabled {
    anyhow::ensure!(
      !config.metrics.bind_address.is_empty(),
      "metrics.bind_address must not be empty when metrics are enabled"
    );
  }

  Ok(())
}
