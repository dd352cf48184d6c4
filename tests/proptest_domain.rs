//! Property-Based Tests - Ledger and Ranking Invariants
//!
//! Uses `proptest` to verify that retention and leaderboard invariants
//! hold across random trade histories.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use pump_trend_terminal::domain::{RankingEngine, TokenLedger, TokenMeta, Trade};

const RETENTION_MS: i64 = 600_000;

fn base() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

fn meta(token: u8) -> TokenMeta {
    TokenMeta {
        symbol: format!("T{token}"),
        name: format!("Token {token}"),
        dex: "pump".to_string(),
    }
}

/// Ingestion cycles: (offset from base in seconds, token, volume, price),
/// replayed in ascending time order like real polling.
fn cycles() -> impl Strategy<Value = Vec<(i64, u8, f64, f64)>> {
    prop::collection::vec((0i64..3600, 0u8..20, 0.0f64..10_000.0, 0.0f64..5.0), 1..200)
        .prop_map(|mut v| {
            v.sort_by_key(|c| c.0);
            v
        })
}

fn replay(cycles: &[(i64, u8, f64, f64)]) -> (TokenLedger, DateTime<Utc>) {
    let mut ledger = TokenLedger::new(RETENTION_MS);
    let mut now = base();
    for &(offset, token, volume, price) in cycles {
        now = base() + Duration::seconds(offset);
        ledger.upsert_trade(
            &format!("mint{token}"),
            meta(token),
            Trade::new(now, volume, price),
            now,
        );
    }
    (ledger, now)
}

// ── Ledger Properties ───────────────────────────────────────

proptest! {
    /// After a sweep every retained trade is younger than the retention window.
    #[test]
    fn swept_trades_within_retention(cycles in cycles(), extra in 0i64..1200) {
        let (mut ledger, last) = replay(&cycles);
        let now = last + Duration::seconds(extra);
        ledger.sweep(now);

        for record in ledger.snapshot() {
            for trade in &record.trades {
                prop_assert!(trade.age_ms(now) < RETENTION_MS);
            }
        }
    }

    /// A touched record only holds trades inside the window of its last write,
    /// in ascending time order.
    #[test]
    fn touched_record_is_pruned_and_ordered(cycles in cycles()) {
        let (ledger, _) = replay(&cycles);
        let (_, last_token, _, _) = *cycles.last().unwrap();
        let last_now = base() + Duration::seconds(cycles.last().unwrap().0);

        let record = ledger.get(&format!("mint{last_token}")).unwrap();
        prop_assert!(!record.trades.is_empty());
        for pair in record.trades.windows(2) {
            prop_assert!(pair[0].observed_at <= pair[1].observed_at);
        }
        for trade in &record.trades {
            prop_assert!(trade.age_ms(last_now) < RETENTION_MS);
        }
    }

    /// Tokens are never removed, only emptied.
    #[test]
    fn token_count_is_monotonic(cycles in cycles()) {
        let (mut ledger, last) = replay(&cycles);
        let before = ledger.token_count();
        ledger.sweep(last + Duration::hours(1));
        prop_assert_eq!(ledger.token_count(), before);
        prop_assert_eq!(ledger.trade_count(), 0);
    }
}

// ── Ranking Properties ──────────────────────────────────────

proptest! {
    /// Volume leaderboard is sorted descending and sized min(10, active tokens).
    #[test]
    fn volume_ranking_sorted_and_bounded(cycles in cycles()) {
        let (ledger, _) = replay(&cycles);
        let records = ledger.snapshot();
        let engine = RankingEngine::default();

        let top = engine.top_by_volume(&records);
        let active = records.iter().filter(|r| !r.trades.is_empty()).count();

        prop_assert_eq!(top.len(), active.min(10));
        for pair in top.windows(2) {
            prop_assert!(pair[0].volume >= pair[1].volume);
        }
    }

    /// Same snapshot and same `now` give identical leaderboards.
    #[test]
    fn rankings_are_idempotent(cycles in cycles(), lag in 0i64..300) {
        let (ledger, last) = replay(&cycles);
        let records = ledger.snapshot();
        let engine = RankingEngine::default();
        let now = last + Duration::seconds(lag);

        prop_assert_eq!(engine.top_trending(&records, now), engine.top_trending(&records, now));
        prop_assert_eq!(engine.top_surge(&records, now), engine.top_surge(&records, now));
        prop_assert_eq!(engine.top_by_volume(&records), engine.top_by_volume(&records));
    }

    /// Surge is always finite and non-negative.
    #[test]
    fn surge_is_finite(cycles in cycles(), lag in 0i64..300) {
        let (ledger, last) = replay(&cycles);
        let now = last + Duration::seconds(lag);
        for entry in RankingEngine::default().top_surge(&ledger.snapshot(), now) {
            prop_assert!(entry.surge.is_finite());
            prop_assert!(entry.surge >= 0.0);
        }
    }
}
