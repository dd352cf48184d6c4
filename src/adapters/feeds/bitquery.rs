//! Bitquery Trade Feed - GraphQL Client for Solana DEX Trades
//!
//! Wraps reqwest with bearer authentication and the DEXTrades query.
//! One POST per call, no retries: a failed round-trip surfaces as a
//! `FeedError` and the caller waits for its next tick.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use super::types::{dex_trades_query, DexTradeRow, GraphQlRequest, GraphQlResponse};
use crate::ports::trade_feed::{FeedError, FeedTrade, TradeFeed};

/// Longest error body kept in a `FeedError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the Bitquery client.
#[derive(Debug, Clone)]
pub struct BitqueryConfig {
  /// GraphQL endpoint URL.
  pub url: String,
  /// Bearer token.
  pub api_key: String,
  /// Request timeout.
  pub timeout: Duration,
}

impl Default for BitqueryConfig {
  fn default() -> Self {
    Self {
      url: "https://streaming.bitquery.io/eap".to_string(),
      api_key: String::new(),
      timeout: Duration::from_secs(10),
    }
  }
}

/// GraphQL client for the Bitquery streaming endpoint.
pub struct BitqueryFeed {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: BitqueryConfig,
}

impl BitqueryFeed {
  /// Create a new Bitquery client.
  pub fn new(config: BitqueryConfig) -> anyhow::Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  /// Endpoint this client posts to.
  pub fn url(&self) -> &str {
    &self.config.url
  }
}

#[async_trait]
impl TradeFeed for BitqueryFeed {
  async fn fetch_recent(&self, limit: usize) -> Result<Vec<FeedTrade>, FeedError> {
    let started = Instant::now();
    let body = GraphQlRequest {
      query: dex_trades_query(limit),
    };

    let response = self
      .http
      .post(&self.config.url)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| FeedError::Unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let mut body = response.text().await.unwrap_or_default();
      body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
      warn!(status = %status, "Bitquery rejected request");
      return Err(FeedError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let envelope: GraphQlResponse = response
      .json()
      .await
      .map_err(|e| FeedError::Malformed(e.to_string()))?;

    let trades = decode_envelope(envelope)?;

    debug!(
      records = trades.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "Bitquery batch fetched"
    );

    Ok(trades)
  }

  fn name(&self) -> &'static str {
    "bitquery"
  }
}

/// Turn a decoded envelope into feed records.
///
/// Query errors take precedence; a response without the DEXTrades list
/// is malformed.
pub fn decode_envelope(envelope: GraphQlResponse) -> Result<Vec<FeedTrade>, FeedError> {
  if !envelope.errors.is_empty() {
    let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
    return Err(FeedError::Query(messages.join("; ")));
  }

  let rows = envelope
    .data
    .and_then(|d| d.solana)
    .and_then(|s| s.dex_trades)
    .ok_or_else(|| FeedError::Malformed("missing data.Solana.DEXTrades".to_string()))?;

  Ok(
    rows
      .into_iter()
      .map(|row| DexTradeRow::from_value(row).into_feed_trade())
      .collect(),
  )
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
  if s.len() <= max {
    return s.len();
  }
  (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(value: serde_json::Value) -> GraphQlResponse {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_decode_envelope_rows() {
    let env = envelope(json!({
      "data": { "Solana": { "DEXTrades": [
        { "Trade": { "Dex": { "ProtocolName": "pump" },
                     "Buy": { "AmountInUSD": "3", "Price": "0.1",
                              "Currency": { "MintAddress": "m1", "Symbol": "A", "Name": "Alpha" } } } },
        { "Trade": { "Dex": { "ProtocolName": "raydium" },
                     "Buy": { "Currency": { "MintAddress": "m2" } } } }
      ] } }
    }));

    let trades = decode_envelope(env).unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].token_id.as_deref(), Some("m1"));
    assert_eq!(trades[0].volume_usd, Some(3.0));
    assert_eq!(trades[1].protocol.as_deref(), Some("raydium"));
  }

  #[test]
  fn test_decode_envelope_query_errors() {
    let env = envelope(json!({
      "data": null,
      "errors": [{ "message": "bad token" }, { "message": "quota" }]
    }));

    let err = decode_envelope(env).unwrap_err();
    assert!(matches!(err, FeedError::Query(ref m) if m == "bad token; quota"));
  }

  #[test]
  fn test_decode_envelope_missing_trades() {
    let env = envelope(json!({ "data": { "Solana": {} } }));
    assert!(matches!(decode_envelope(env), Err(FeedError::Malformed(_))));
  }

  #[test]
  fn test_floor_char_boundary() {
    assert_eq!(floor_char_boundary("abc", 10), 3);
    assert_eq!(floor_char_boundary("héllo", 2), 1);
  }

  #[test]
  fn test_client_builds_with_defaults() {
    let feed = BitqueryFeed::new(BitqueryConfig::default()).unwrap();
    assert_eq!(feed.url(), "https://streaming.bitquery.io/eap");
    assert_eq!(feed.name(), "bitquery");
  }
}
