//! Trade Feed Port - Recent DEX Trade Retrieval Interface
//!
//! Defines the trait for pulling the latest batch of trades from an
//! external trade-data provider, plus the raw record shape and error
//! taxonomy shared by every feed adapter.

use async_trait::async_trait;
use thiserror::Error;

/// One trade record as delivered by the feed, before normalization.
///
/// Every field is optional: providers omit fields freely and the
/// ingestor decides which gaps are fatal for a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedTrade {
  /// DEX protocol name as reported (any case).
  pub protocol: Option<String>,
  /// Buy-side currency mint address.
  pub token_id: Option<String>,
  /// Buy-side currency symbol.
  pub symbol: Option<String>,
  /// Buy-side currency display name.
  pub name: Option<String>,
  /// Trade amount in USD, if numeric.
  pub volume_usd: Option<f64>,
  /// Trade price, if numeric.
  pub price: Option<f64>,
}

/// Failure of a whole feed round-trip.
///
/// Any variant means the batch is unusable and the cycle is skipped.
#[derive(Debug, Error)]
pub enum FeedError {
  /// Transport failure (DNS, connect, timeout, TLS).
  #[error("feed unavailable: {0}")]
  Unavailable(String),
  /// Non-2xx HTTP response.
  #[error("feed returned HTTP {status}: {body}")]
  Status {
    /// HTTP status code.
    status: u16,
    /// Response body, possibly truncated.
    body: String,
  },
  /// The provider reported query errors.
  #[error("feed query failed: {0}")]
  Query(String),
  /// The payload could not be decoded into trade records.
  #[error("malformed feed payload: {0}")]
  Malformed(String),
}

impl FeedError {
  /// Short label used for metrics and logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Unavailable(_) => "unavailable",
      Self::Status { .. } => "status",
      Self::Query(_) => "query",
      Self::Malformed(_) => "malformed",
    }
  }
}

/// Trait for trade-data providers.
///
/// Implementors perform one request per call and return records
/// newest-first. They never retry: the next scheduled tick is the retry.
#[async_trait]
pub trait TradeFeed: Send + Sync + 'static {
  /// Fetch up to `limit` of the most recent trades, newest first.
  async fn fetch_recent(&self, limit: usize) -> Result<Vec<FeedTrade>, FeedError>;

  /// Provider name for logging.
  fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_feed_error_display_and_kind() {
    let err = FeedError::Status {
      status: 401,
      body: "unauthorized".to_string(),
    };
    assert_eq!(err.to_string(), "feed returned HTTP 401: unauthorized");
    assert_eq!(err.kind(), "status");
    assert_eq!(FeedError::Malformed("x".into()).kind(), "malformed");
  }
}
