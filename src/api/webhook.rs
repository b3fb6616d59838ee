//! Inbound webhook from Sonarr.

use axum::{Json, body::Bytes, extract::State};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, AppState, RelayResponse};
use crate::domain::{IgnoreReason, RelayOutcome};
use crate::models::WebhookPayload;

/// `POST /`
///
/// Takes the raw body so that anything which is not a notification payload
/// (including invalid JSON) is answered with `ignored` instead of a 4xx.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RelayResponse>, ApiError> {
    info!(bytes = body.len(), "Received webhook data from Sonarr");

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            info!(error = %e, "Ignoring undecodable webhook body");
            return Ok(Json(RelayResponse::ignored(IgnoreReason::Unrecognized)));
        }
    };

    match state.relay.handle(payload).await {
        RelayOutcome::Forwarded { status, .. } => Ok(Json(RelayResponse::forwarded(status))),
        RelayOutcome::Ignored(reason) => Ok(Json(RelayResponse::ignored(reason))),
        RelayOutcome::Failed { message } => Err(ApiError::ForwardFailed(message)),
    }
}
