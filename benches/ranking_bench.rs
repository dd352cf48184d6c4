//! Ranking Benchmarks - Per-request Leaderboard Cost
//!
//! Benchmarks the three projections over a full ledger snapshot, the
//! work done on every query request.
//!
//! Run with: cargo bench --bench ranking_bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pump_trend_terminal::domain::{RankingEngine, TokenLedger, TokenMeta, TokenRecord, Trade};

/// 500 tokens, 150 cycles of 4s each (10 minutes of polling).
fn populated() -> (Vec<TokenRecord>, chrono::DateTime<Utc>) {
    let start = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let mut ledger = TokenLedger::default();
    let mut now = start;

    for cycle in 0..150i64 {
        now = start + Duration::seconds(cycle * 4);
        for i in 0..100u32 {
            let token = (cycle as u32 * 7 + i) % 500;
            ledger.upsert_trade(
                &format!("mint{token}"),
                TokenMeta {
                    symbol: format!("T{token}"),
                    name: format!("Token {token}"),
                    dex: "pump".to_string(),
                },
                Trade::new(now, f64::from(i) * 3.5, 0.0001 * f64::from(token + 1)),
                now,
            );
        }
    }

    (ledger.snapshot(), now)
}

fn bench_top_by_volume(c: &mut Criterion) {
    let (records, _) = populated();
    let engine = RankingEngine::default();

    c.bench_function("top_by_volume_500_tokens", |b| {
        b.iter(|| engine.top_by_volume(black_box(&records)));
    });
}

fn bench_top_trending(c: &mut Criterion) {
    let (records, now) = populated();
    let engine = RankingEngine::default();

    c.bench_function("top_trending_500_tokens", |b| {
        b.iter(|| engine.top_trending(black_box(&records), black_box(now)));
    });
}

fn bench_top_surge(c: &mut Criterion) {
    let (records, now) = populated();
    let engine = RankingEngine::default();

    c.bench_function("top_surge_500_tokens", |b| {
        b.iter(|| engine.top_surge(black_box(&records), black_box(now)));
    });
}

criterion_group!(
    benches,
    bench_top_by_volume,
    bench_top_trending,
    bench_top_surge,
);
criterion_main!(benches);
