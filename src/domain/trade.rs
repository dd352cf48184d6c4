//! Core trade domain types.
//!
//! Defines the per-token entities held by the ledger: the immutable
//! `Trade` event, the first-seen `TokenMeta`, and the mutable
//! `TokenRecord` owning a token's retained trade history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token identifier (mint / contract address).
pub type TokenId = String;

/// A single observed trade, immutable once created.
///
/// Serialized as `{ "time": <unix ms>, "volume": .., "price": .. }`,
/// which is the shape `/top-meme` clients consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Ingestion-cycle timestamp (shared by every trade of one batch).
    #[serde(rename = "time", with = "chrono::serde::ts_milliseconds")]
    pub observed_at: DateTime<Utc>,
    /// Trade volume in USD (>= 0).
    #[serde(rename = "volume")]
    pub volume_usd: f64,
    /// Trade price (>= 0).
    pub price: f64,
}

impl Trade {
    /// Build a trade, clamping negative or non-finite amounts to zero.
    pub fn new(observed_at: DateTime<Utc>, volume_usd: f64, price: f64) -> Self {
        Self {
            observed_at,
            volume_usd: non_negative(volume_usd),
            price: non_negative(price),
        }
    }

    /// Age of this trade relative to `now`, in milliseconds.
    ///
    /// Negative when the trade is newer than `now`.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.observed_at).num_milliseconds()
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Descriptive metadata captured at a token's first observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    /// Ticker symbol.
    pub symbol: String,
    /// Human-readable name.
    pub name: String,
    /// Lower-cased protocol the token was first seen trading on.
    pub dex: String,
}

/// One tracked token and its retained trade history.
///
/// `trades` is ordered by `observed_at` ascending (append order).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    /// Mint address, unique key in the ledger.
    pub token_id: TokenId,
    /// First-write-wins metadata.
    pub meta: TokenMeta,
    /// Retained trades, oldest first.
    pub trades: Vec<Trade>,
}

impl TokenRecord {
    /// Create an empty record for a newly observed token.
    pub fn new(token_id: TokenId, meta: TokenMeta) -> Self {
        Self {
            token_id,
            meta,
            trades: Vec::new(),
        }
    }

    /// Sum of `volume_usd` over every retained trade.
    pub fn total_volume(&self) -> f64 {
        self.trades.iter().map(|t| t.volume_usd).sum()
    }

    /// Drop every trade whose age relative to `now` is at least `retention_ms`.
    ///
    /// Returns the number of trades removed.
    pub fn prune(&mut self, now: DateTime<Utc>, retention_ms: i64) -> usize {
        let before = self.trades.len();
        self.trades.retain(|t| t.age_ms(now) < retention_ms);
        before - self.trades.len()
    }
}
