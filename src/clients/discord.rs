use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::constants::USER_AGENT;
use crate::models::WebhookPayload;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
}

impl DiscordClient {
    pub fn new(timeout: Duration) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Posts a webhook message, returning the status Discord answered with.
    pub async fn execute_webhook(
        &self,
        webhook_url: &str,
        payload: &WebhookPayload,
    ) -> Result<u16, DiscordError> {
        let response = self.client.post(webhook_url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook accepted");
        Ok(status.as_u16())
    }
}
