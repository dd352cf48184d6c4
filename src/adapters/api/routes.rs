//! Query Surface - Leaderboard HTTP Endpoints
//!
//! Serves the three leaderboards as JSON arrays:
//! - `GET /top-meme`: by retained volume
//! - `GET /top-trending`: by trending score
//! - `GET /top-surge`: by surge ratio
//!
//! Each request copies a ledger snapshot under a read guard, releases
//! it, then ranks the copy against the current time. An empty ledger
//! yields empty arrays.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

use crate::adapters::metrics::health::health_routes;
use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::domain::ranking::{RankingEngine, SurgeEntry, TrendingEntry, VolumeEntry};
use crate::domain::trade::TokenRecord;
use crate::usecases::SharedLedger;

/// State shared by the leaderboard handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Ledger written by the ingestor.
    pub ledger: SharedLedger,
    /// Ranking configuration.
    pub engine: RankingEngine,
    /// Prometheus metrics.
    pub metrics: Arc<MetricsRegistry>,
}

impl ApiState {
    /// Point-in-time copy of the ledger.
    async fn snapshot(&self) -> Vec<TokenRecord> {
        self.ledger.read().await.snapshot()
    }

    fn count(&self, view: &str) {
        self.metrics
            .ranking_requests
            .with_label_values(&[view])
            .inc();
    }
}

/// Build the full query router (leaderboards, health, CORS).
pub fn router(state: ApiState, health: Arc<HealthState>) -> Router {
    Router::new()
        .route("/top-meme", get(top_meme))
        .route("/top-trending", get(top_trending))
        .route("/top-surge", get(top_surge))
        .with_state(state)
        .merge(health_routes(health))
        .layer(CorsLayer::permissive())
}

/// Serve `app` on `addr` until shutdown.
#[instrument(skip(app, shutdown_rx))]
pub async fn serve(
    app: Router,
    addr: String,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Query server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn top_meme(State(state): State<ApiState>) -> Json<Vec<VolumeEntry>> {
    state.count("volume");
    let records = state.snapshot().await;
    Json(state.engine.top_by_volume(&records))
}

async fn top_trending(State(state): State<ApiState>) -> Json<Vec<TrendingEntry>> {
    state.count("trending");
    let records = state.snapshot().await;
    Json(state.engine.top_trending(&records, Utc::now()))
}

async fn top_surge(State(state): State<ApiState>) -> Json<Vec<SurgeEntry>> {
    state.count("surge");
    let records = state.snapshot().await;
    Json(state.engine.top_surge(&records, Utc::now()))
}
