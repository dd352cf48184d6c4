//! HTTP Query Adapter
//!
//! axum router exposing the leaderboards plus health probes.

pub mod routes;

pub use routes::{router, serve, ApiState};
