//! Ranking Engine - On-demand Token Leaderboards
//!
//! Three independent, read-only projections over a ledger snapshot:
//! - Volume: total USD volume over the full retention window
//! - Trending: weighted blend of short-term volume, trade count,
//!   medium-term volume and price momentum
//! - Surge: last-minute volume relative to the minute before
//!
//! Every projection takes the caller's `now` so repeated calls over the
//! same snapshot and timestamp return identical results.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trade::{TokenRecord, Trade};

/// Default number of entries returned per leaderboard.
pub const DEFAULT_LIMIT: usize = 10;

/// Tunable weights of the trending score.
///
/// `score = vol_1m*w1 + trades_1m*w2 + vol_5m*w3 + price_change*w4`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of last-minute USD volume.
    #[serde(default = "default_vol_1m_weight")]
    pub vol_1m: f64,
    /// Weight of last-minute trade count.
    #[serde(default = "default_trades_1m_weight")]
    pub trades_1m: f64,
    /// Weight of five-minute USD volume.
    #[serde(default = "default_vol_5m_weight")]
    pub vol_5m: f64,
    /// Weight of five-minute price change (percent).
    #[serde(default = "default_price_change_weight")]
    pub price_change: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            vol_1m: default_vol_1m_weight(),
            trades_1m: default_trades_1m_weight(),
            vol_5m: default_vol_5m_weight(),
            price_change: default_price_change_weight(),
        }
    }
}

fn default_vol_1m_weight() -> f64 {
    2.0
}

fn default_trades_1m_weight() -> f64 {
    5.0
}

fn default_vol_5m_weight() -> f64 {
    1.0
}

fn default_price_change_weight() -> f64 {
    10.0
}

/// Window lengths used by the trending and surge projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingWindows {
    /// Short window (trending 1m figures, surge "now" bucket) in ms.
    pub short_ms: i64,
    /// Trending medium window (5m volume and price change) in ms.
    pub trend_ms: i64,
}

impl Default for RankingWindows {
    fn default() -> Self {
        Self {
            short_ms: 60_000,
            trend_ms: 300_000,
        }
    }
}

/// `/top-meme` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeEntry {
    pub token: String,
    pub symbol: String,
    pub name: String,
    pub dex: String,
    /// Raw retained trades.
    pub trades: Vec<Trade>,
    pub volume: f64,
}

/// `/top-trending` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingEntry {
    pub token: String,
    pub symbol: String,
    pub name: String,
    pub dex: String,
    #[serde(rename = "vol1m")]
    pub vol_1m: f64,
    #[serde(rename = "vol5m")]
    pub vol_5m: f64,
    #[serde(rename = "trades1m")]
    pub trades_1m: usize,
    #[serde(rename = "priceChange")]
    pub price_change: f64,
    pub score: f64,
}

/// `/top-surge` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurgeEntry {
    pub token: String,
    pub symbol: String,
    pub name: String,
    pub dex: String,
    #[serde(rename = "volNow")]
    pub vol_now: f64,
    #[serde(rename = "volPrev")]
    pub vol_prev: f64,
    pub surge: f64,
}

/// Stateless leaderboard calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingEngine {
    weights: ScoringWeights,
    windows: RankingWindows,
    limit: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), RankingWindows::default(), DEFAULT_LIMIT)
    }
}

impl RankingEngine {
    /// Create an engine with explicit weights, windows and result limit.
    pub fn new(weights: ScoringWeights, windows: RankingWindows, limit: usize) -> Self {
        Self {
            weights,
            windows,
            limit,
        }
    }

    /// Maximum number of entries per leaderboard.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tokens ranked by total retained volume, descending.
    pub fn top_by_volume(&self, records: &[TokenRecord]) -> Vec<VolumeEntry> {
        let ranked = active(records)
            .map(|r| VolumeEntry {
                token: r.token_id.clone(),
                symbol: r.meta.symbol.clone(),
                name: r.meta.name.clone(),
                dex: r.meta.dex.clone(),
                trades: r.trades.clone(),
                volume: r.total_volume(),
            })
            .collect();
        self.top(ranked, |e| e.volume)
    }

    /// Tokens ranked by trending score, descending.
    pub fn top_trending(
        &self,
        records: &[TokenRecord],
        now: DateTime<Utc>,
    ) -> Vec<TrendingEntry> {
        let ranked = active(records).map(|r| self.trending(r, now)).collect();
        self.top(ranked, |e| e.score)
    }

    /// Tokens ranked by surge ratio, descending.
    pub fn top_surge(&self, records: &[TokenRecord], now: DateTime<Utc>) -> Vec<SurgeEntry> {
        let ranked = active(records).map(|r| self.surge(r, now)).collect();
        self.top(ranked, |e| e.surge)
    }

    /// Trending figures for a single token.
    pub fn trending(&self, record: &TokenRecord, now: DateTime<Utc>) -> TrendingEntry {
        let (vol_1m, trades_1m) =
            window_totals(&record.trades, now, i64::MIN, self.windows.short_ms);

        let last_5m: Vec<&Trade> = record
            .trades
            .iter()
            .filter(|t| t.age_ms(now) < self.windows.trend_ms)
            .collect();
        let vol_5m = last_5m.iter().map(|t| t.volume_usd).sum::<f64>();
        let price_change = price_change_pct(&last_5m);

        let w = &self.weights;
        let score = vol_1m * w.vol_1m
            + trades_1m as f64 * w.trades_1m
            + vol_5m * w.vol_5m
            + price_change * w.price_change;

        TrendingEntry {
            token: record.token_id.clone(),
            symbol: record.meta.symbol.clone(),
            name: record.meta.name.clone(),
            dex: record.meta.dex.clone(),
            vol_1m,
            vol_5m,
            trades_1m,
            price_change,
            score,
        }
    }

    /// Surge figures for a single token.
    ///
    /// Without prior-minute volume the surge is the raw current volume.
    pub fn surge(&self, record: &TokenRecord, now: DateTime<Utc>) -> SurgeEntry {
        let short = self.windows.short_ms;
        let (vol_now, _) = window_totals(&record.trades, now, i64::MIN, short);
        let (vol_prev, _) = window_totals(&record.trades, now, short, short.saturating_mul(2));

        let surge = if vol_prev > 0.0 {
            vol_now / vol_prev
        } else {
            vol_now
        };

        SurgeEntry {
            token: record.token_id.clone(),
            symbol: record.meta.symbol.clone(),
            name: record.meta.name.clone(),
            dex: record.meta.dex.clone(),
            vol_now,
            vol_prev,
            surge,
        }
    }

    /// Stable descending sort on `key`, truncated to the limit.
    fn top<T>(&self, mut entries: Vec<T>, key: impl Fn(&T) -> f64) -> Vec<T> {
        entries.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
        entries.truncate(self.limit);
        entries
    }
}

/// Records holding at least one retained trade.
fn active(records: &[TokenRecord]) -> impl Iterator<Item = &TokenRecord> {
    records.iter().filter(|r| !r.trades.is_empty())
}

/// Volume and count of trades with `min_age_ms <= age < max_age_ms`.
///
/// `i64::MIN` as the lower bound makes the window open-ended.
fn window_totals(
    trades: &[Trade],
    now: DateTime<Utc>,
    min_age_ms: i64,
    max_age_ms: i64,
) -> (f64, usize) {
    trades
        .iter()
        .filter(|t| {
            let age = t.age_ms(now);
            age >= min_age_ms && age < max_age_ms
        })
        .fold((0.0, 0), |(vol, n), t| (vol + t.volume_usd, n + 1))
}

/// Percent change between the first and last trade price of a window.
///
/// Zero with fewer than two trades or a zero opening price.
fn price_change_pct(window: &[&Trade]) -> f64 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() > 1 && first.price > 0.0 => {
            (last.price - first.price) / first.price * 100.0
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TokenMeta;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn record(token: &str, trades: &[(i64, f64, f64)]) -> TokenRecord {
        let mut r = TokenRecord::new(
            token.to_string(),
            TokenMeta {
                symbol: token.to_uppercase(),
                name: format!("{token} token"),
                dex: "pump".to_string(),
            },
        );
        for &(age_secs, volume, price) in trades {
            r.trades
                .push(Trade::new(now() - Duration::seconds(age_secs), volume, price));
        }
        r
    }

    #[test]
    fn test_trending_window_figures() {
        let engine = RankingEngine::default();
        let r = record("a", &[(90, 50.0, 1.0), (30, 100.0, 1.0)]);

        let entry = engine.trending(&r, now());

        assert_eq!(entry.vol_1m, 100.0);
        assert_eq!(entry.vol_5m, 150.0);
        assert_eq!(entry.trades_1m, 1);
        assert_eq!(entry.price_change, 0.0);
        assert_eq!(entry.score, 100.0 * 2.0 + 5.0 + 150.0);
    }

    #[test]
    fn test_price_change_uses_first_and_last_in_window() {
        let engine = RankingEngine::default();
        // The 400s-old trade is outside the 5m window and ignored.
        let r = record("a", &[(400, 1.0, 100.0), (200, 1.0, 2.0), (10, 1.0, 3.0)]);

        let entry = engine.trending(&r, now());

        assert!((entry.price_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_change_zero_guards() {
        let engine = RankingEngine::default();

        let single = record("a", &[(10, 1.0, 5.0)]);
        assert_eq!(engine.trending(&single, now()).price_change, 0.0);

        let zero_open = record("b", &[(100, 1.0, 0.0), (10, 1.0, 9.0)]);
        assert_eq!(engine.trending(&zero_open, now()).price_change, 0.0);

        let stale = record("c", &[(500, 1.0, 1.0), (400, 1.0, 9.0)]);
        assert_eq!(engine.trending(&stale, now()).price_change, 0.0);
    }

    #[test]
    fn test_surge_without_previous_volume_is_raw_volume() {
        let engine = RankingEngine::default();
        let r = record("a", &[(10, 100.0, 1.0)]);

        let entry = engine.surge(&r, now());

        assert_eq!(entry.vol_now, 100.0);
        assert_eq!(entry.vol_prev, 0.0);
        assert_eq!(entry.surge, 100.0);
    }

    #[test]
    fn test_surge_ratio_and_bucket_edges() {
        let engine = RankingEngine::default();
        // 60s lands in the previous bucket, 120s falls out of both.
        let r = record(
            "a",
            &[(120, 1000.0, 1.0), (60, 20.0, 1.0), (90, 30.0, 1.0), (5, 100.0, 1.0)],
        );

        let entry = engine.surge(&r, now());

        assert_eq!(entry.vol_now, 100.0);
        assert_eq!(entry.vol_prev, 50.0);
        assert_eq!(entry.surge, 2.0);
    }

    #[test]
    fn test_surge_with_unbounded_short_window() {
        let windows = RankingWindows {
            short_ms: i64::MAX,
            trend_ms: i64::MAX,
        };
        let engine = RankingEngine::new(ScoringWeights::default(), windows, DEFAULT_LIMIT);
        let r = record("a", &[(10, 100.0, 1.0)]);

        let entry = engine.surge(&r, now());

        assert_eq!(entry.vol_now, 100.0);
        assert_eq!(entry.vol_prev, 0.0);
        assert_eq!(entry.surge, 100.0);
    }

    #[test]
    fn test_top_by_volume_sorted_and_limited() {
        let engine = RankingEngine::default();
        let records: Vec<_> = (0..15)
            .map(|i| record(&format!("t{i}"), &[(10, f64::from(i), 1.0)]))
            .collect();

        let top = engine.top_by_volume(&records);

        assert_eq!(top.len(), 10);
        assert_eq!(top[0].token, "t14");
        assert!(top.windows(2).all(|w| w[0].volume >= w[1].volume));
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let engine = RankingEngine::default();
        let records = vec![
            record("first", &[(10, 5.0, 1.0)]),
            record("second", &[(10, 5.0, 1.0)]),
            record("third", &[(10, 7.0, 1.0)]),
        ];

        let top = engine.top_by_volume(&records);
        let order: Vec<_> = top.iter().map(|e| e.token.as_str()).collect();

        assert_eq!(order, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_empty_records_are_not_ranked() {
        let engine = RankingEngine::default();
        let records = vec![record("empty", &[]), record("live", &[(10, 1.0, 1.0)])];

        assert_eq!(engine.top_by_volume(&records).len(), 1);
        assert_eq!(engine.top_trending(&records, now()).len(), 1);
        assert_eq!(engine.top_surge(&records, now()).len(), 1);
        assert!(engine.top_by_volume(&[]).is_empty());
    }

    #[test]
    fn test_custom_weights_apply() {
        let weights = ScoringWeights {
            vol_1m: 0.0,
            trades_1m: 1.0,
            vol_5m: 0.0,
            price_change: 0.0,
        };
        let engine = RankingEngine::new(weights, RankingWindows::default(), 3);
        let r = record("a", &[(10, 100.0, 1.0), (20, 100.0, 1.0)]);

        assert_eq!(engine.trending(&r, now()).score, 2.0);
    }

    #[test]
    fn test_entry_field_names() {
        let engine = RankingEngine::default();
        let r = record("a", &[(10, 1.0, 1.0)]);

        let trending = serde_json::to_value(engine.trending(&r, now())).unwrap();
        for key in ["token", "symbol", "name", "dex", "vol1m", "vol5m", "trades1m", "priceChange", "score"] {
            assert!(trending.get(key).is_some(), "missing {key}");
        }

        let surge = serde_json::to_value(engine.surge(&r, now())).unwrap();
        for key in ["volNow", "volPrev", "surge"] {
            assert!(surge.get(key).is_some(), "missing {key}");
        }
    }
}
