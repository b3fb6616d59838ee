use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::RelayResponse;

#[derive(Debug)]
pub enum ApiError {
    /// The destination webhook could not be reached or refused the payload.
    ForwardFailed(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ForwardFailed(msg) => write!(f, "Forward failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::ForwardFailed(message) = self;

        let body = RelayResponse::error(message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
