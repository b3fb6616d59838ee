use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::RelayService;

mod error;
mod observability;
mod system;
mod types;
mod webhook;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(relay: RelayService, prometheus_handle: Option<PrometheusHandle>) -> Arc<Self> {
        Arc::new(Self {
            relay: Arc::new(relay),
            start_time: std::time::Instant::now(),
            prometheus_handle,
        })
    }
}

pub fn create_app_state(
    config: &Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let relay = RelayService::from_config(config)?;
    Ok(AppState::new(relay, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(webhook::receive))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
