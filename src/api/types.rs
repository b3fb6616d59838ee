use serde::Serialize;

use crate::domain::IgnoreReason;

/// Body returned to Sonarr for every webhook call.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: &'static str,
    /// Status code the destination webhook answered with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IgnoreReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RelayResponse {
    #[must_use]
    pub const fn forwarded(status: u16) -> Self {
        Self {
            status: "forwarded",
            response: Some(status),
            reason: None,
            message: None,
        }
    }

    #[must_use]
    pub const fn ignored(reason: IgnoreReason) -> Self {
        Self {
            status: "ignored",
            response: None,
            reason: Some(reason),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            response: None,
            reason: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
