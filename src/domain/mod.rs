//! Domain layer - Core aggregation and ranking logic.
//!
//! Pure, synchronous code: the token ledger with its retention policy and
//! the ranking projections computed over ledger snapshots. No I/O here
//! (hexagonal architecture inner ring).

pub mod ledger;
pub mod ranking;
pub mod trade;

// Re-export core types for convenience
pub use ledger::TokenLedger;
pub use ranking::{
    RankingEngine, RankingWindows, ScoringWeights, SurgeEntry, TrendingEntry, VolumeEntry,
};
pub use trade::{TokenId, TokenMeta, TokenRecord, Trade};
