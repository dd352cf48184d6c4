//! Health Checks - Liveness and Readiness Probes
//!
//! Exposes /live and /ready handlers for Docker health checks and
//! monitoring. Readiness reflects whether the most recent feed
//! cycle succeeded.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Shared health state polled by readiness probes.
#[derive(Debug)]
pub struct HealthState {
    /// Whether the last feed cycle succeeded.
    feed_healthy: AtomicBool,
    /// Unix ms of the last successful ingestion, 0 if none yet.
    last_ingest_ms: AtomicI64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state. Not ready until the first fetch lands.
    pub fn new() -> Self {
        Self {
            feed_healthy: AtomicBool::new(false),
            last_ingest_ms: AtomicI64::new(0),
        }
    }

    /// Record a successful ingestion cycle at `at_ms`.
    pub fn mark_ingested(&self, at_ms: i64) {
        self.last_ingest_ms.store(at_ms, Ordering::Relaxed);
        self.feed_healthy.store(true, Ordering::Relaxed);
    }

    /// Record a failed feed round-trip.
    pub fn mark_feed_failed(&self) {
        self.feed_healthy.store(false, Ordering::Relaxed);
    }

    /// Unix ms of the last successful ingestion, if any.
    pub fn last_ingest_ms(&self) -> Option<i64> {
        match self.last_ingest_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    /// Check if the system is ready to serve fresh data.
    pub fn is_ready(&self) -> bool {
        self.feed_healthy.load(Ordering::Relaxed)
    }
}

/// Router with `/live` and `/ready`, merged into the query surface.
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 200 only if the feed is delivering.
async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}
