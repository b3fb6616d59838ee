use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthResponse};

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
