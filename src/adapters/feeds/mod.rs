//! Trade Feed Adapters - Recent DEX Trade Retrieval
//!
//! Provides the Bitquery GraphQL implementation of the `TradeFeed` port:
//! - `bitquery`: HTTP client with bearer auth
//! - `types`: Lenient GraphQL response model

pub mod bitquery;
pub mod types;

pub use bitquery::{BitqueryConfig, BitqueryFeed};
