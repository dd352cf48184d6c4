//! Use Cases Layer - Application Workflows
//!
//! Orchestrates domain logic with port interfaces. The ledger is owned
//! once and shared behind a single `RwLock`: writers (ingestor, sweeper)
//! apply whole batches under one write guard, readers copy a snapshot
//! under a read guard.
//!
//! Use cases:
//! - `TradeIngestor`: Feed polling, filtering and ledger writes
//! - `LedgerSweeper`: Periodic retention enforcement

pub mod ingestor;
pub mod sweeper;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::TokenLedger;

pub use ingestor::{CycleReport, TradeIngestor};
pub use sweeper::LedgerSweeper;

/// The single ledger instance shared across tasks.
pub type SharedLedger = Arc<RwLock<TokenLedger>>;

/// Wrap a ledger for sharing.
pub fn shared_ledger(ledger: TokenLedger) -> SharedLedger {
    Arc::new(RwLock::new(ledger))
}
