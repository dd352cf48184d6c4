//! Token Ledger - In-memory Rolling Trade History
//!
//! Maps each token to its retained trades. Records are created on first
//! observation and never removed; only their trade lists shrink as
//! pruning drops trades older than the retention window.
//!
//! Records are kept in first-seen order so that every read path iterates
//! tokens deterministically.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::trade::{TokenId, TokenMeta, TokenRecord, Trade};

/// Default retention horizon: 10 minutes.
pub const DEFAULT_RETENTION_MS: i64 = 10 * 60 * 1000;

/// Owned mapping from token id to its rolling trade history.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    /// Records in first-seen order.
    records: Vec<TokenRecord>,
    /// Position of each token in `records`.
    index: HashMap<TokenId, usize>,
    /// Retention window in milliseconds.
    retention_ms: i64,
}

impl Default for TokenLedger {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_MS)
    }
}

impl TokenLedger {
    /// Create an empty ledger with the given retention window.
    pub fn new(retention_ms: i64) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            retention_ms,
        }
    }

    /// Retention window in milliseconds.
    pub fn retention_ms(&self) -> i64 {
        self.retention_ms
    }

    /// Append `trade` to the token's history, creating the record on first
    /// sight, then prune the record relative to `now`.
    ///
    /// `meta` is only used when the record is created; later metadata for
    /// the same token is ignored.
    pub fn upsert_trade(
        &mut self,
        token_id: &str,
        meta: TokenMeta,
        trade: Trade,
        now: DateTime<Utc>,
    ) {
        let slot = match self.index.get(token_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.records.len();
                self.records
                    .push(TokenRecord::new(token_id.to_string(), meta));
                self.index.insert(token_id.to_string(), slot);
                slot
            }
        };

        let record = &mut self.records[slot];
        record.trades.push(trade);
        record.prune(now, self.retention_ms);
    }

    /// Prune every record relative to `now`, touched or not.
    ///
    /// Returns the total number of trades dropped.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let retention_ms = self.retention_ms;
        self.records
            .iter_mut()
            .map(|record| record.prune(now, retention_ms))
            .sum()
    }

    /// Point-in-time copy of every record, in first-seen order.
    pub fn snapshot(&self) -> Vec<TokenRecord> {
        self.records.clone()
    }

    /// Look up a single record.
    pub fn get(&self, token_id: &str) -> Option<&TokenRecord> {
        self.index.get(token_id).map(|&slot| &self.records[slot])
    }

    /// Number of distinct tokens ever observed.
    pub fn token_count(&self) -> usize {
        self.records.len()
    }

    /// Total number of retained trades across all tokens.
    pub fn trade_count(&self) -> usize {
        self.records.iter().map(|r| r.trades.len()).sum()
    }

    /// Whether no token has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
