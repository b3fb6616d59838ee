//! Delivery of enriched notifications and correction alerts.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::clients::{DiscordClient, DiscordError};
use crate::constants::embed;
use crate::models::{Correction, Embed, EmbedAuthor, EmbedField, WebhookPayload};

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("destination answered {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl From<DiscordError> for ForwardError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::Http(e) => Self::Transport(e.to_string()),
            DiscordError::Rejected { status, body } => Self::Rejected {
                status,
                message: body,
            },
        }
    }
}

/// Anything a webhook payload can be posted to.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Returns the HTTP status of an accepted delivery.
    async fn send(&self, url: &str, payload: &WebhookPayload) -> Result<u16, ForwardError>;
}

#[async_trait]
impl WebhookSink for DiscordClient {
    async fn send(&self, url: &str, payload: &WebhookPayload) -> Result<u16, ForwardError> {
        Ok(self.execute_webhook(url, payload).await?)
    }
}

#[derive(Clone)]
pub struct Forwarder {
    sink: Arc<dyn WebhookSink>,
    webhook_url: String,
    override_webhook_url: Option<String>,
}

impl Forwarder {
    #[must_use]
    pub fn new(
        sink: Arc<dyn WebhookSink>,
        webhook_url: impl Into<String>,
        override_webhook_url: Option<String>,
    ) -> Self {
        Self {
            sink,
            webhook_url: webhook_url.into(),
            override_webhook_url,
        }
    }

    /// Posts to the main destination. Single attempt.
    pub async fn forward(&self, payload: &WebhookPayload) -> Result<u16, ForwardError> {
        info!("Notifying Discord of new episode");
        let status = self.sink.send(&self.webhook_url, payload).await?;
        info!(status, "Notified Discord");
        Ok(status)
    }

    /// Posts a correction alert if a secondary destination is configured.
    ///
    /// Failures are logged and swallowed; returns whether an alert was delivered.
    pub async fn alert_correction(&self, correction: &Correction) -> bool {
        let Some(url) = &self.override_webhook_url else {
            debug!("No override webhook configured, skipping correction alert");
            return false;
        };

        info!(
            original = %correction.original_title,
            corrected = %correction.corrected_title,
            "Notifying Discord of improper/overwritten data"
        );

        let payload = correction_alert(correction);
        match self.sink.send(url, &payload).await {
            Ok(status) => {
                info!(status, "Correction alert delivered");
                metrics::counter!("correction_alerts_total", "result" => "delivered").increment(1);
                true
            }
            Err(e) => {
                error!(error = %e, "Error sending correction alert");
                metrics::counter!("correction_alerts_total", "result" => "failed").increment(1);
                false
            }
        }
    }
}

/// Builds the "improper episode metadata" warning embed.
#[must_use]
pub fn correction_alert(correction: &Correction) -> WebhookPayload {
    WebhookPayload::single(Embed {
        author: Some(EmbedAuthor::named(embed::CORRECTION_AUTHOR)),
        title: Some(correction.full_title.clone()),
        url: Some(correction.detail_url.clone()),
        description: Some(embed::CORRECTION_DESCRIPTION.to_string()),
        color: Some(embed::CORRECTION_COLOR),
        fields: vec![
            EmbedField::new(
                embed::ORIGINAL_TITLE_FIELD,
                correction.original_title.clone(),
                false,
            ),
            EmbedField::new(
                embed::NEW_TITLE_FIELD,
                correction.corrected_title.clone(),
                false,
            ),
        ],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, WebhookPayload)>>,
        fail_urls: Vec<String>,
    }

    #[async_trait]
    impl WebhookSink for RecordingSink {
        async fn send(&self, url: &str, payload: &WebhookPayload) -> Result<u16, ForwardError> {
            self.sent
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            if self.fail_urls.iter().any(|u| u == url) {
                return Err(ForwardError::Transport("connection refused".into()));
            }
            Ok(204)
        }
    }

    fn correction() -> Correction {
        Correction {
            original_title: "TBA".into(),
            corrected_title: "The Real Title".into(),
            full_title: "Show - 1x02 - The Real Title".into(),
            detail_url: "https://thetvdb.com/series/show/episodes/2".into(),
            title_replaced: true,
            overview_backfilled: false,
        }
    }

    #[test]
    fn test_alert_layout() {
        let payload = correction_alert(&correction());
        let embed = payload.embed(0).unwrap();

        assert_eq!(embed.author.as_ref().unwrap().name, embed::CORRECTION_AUTHOR);
        assert_eq!(embed.title.as_deref(), Some("Show - 1x02 - The Real Title"));
        assert_eq!(embed.color, Some(0xFFC030));
        assert_eq!(embed.field_value("Original Episode Title"), Some("TBA"));
        assert_eq!(embed.field_value("New Episode Title"), Some("The Real Title"));
        assert!(embed.fields.iter().all(|f| !f.inline));
    }

    #[tokio::test]
    async fn test_alert_skipped_without_override() {
        let sink = Arc::new(RecordingSink::default());
        let forwarder = Forwarder::new(sink.clone(), "https://main", None);

        assert!(!forwarder.alert_correction(&correction()).await);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_alert_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail_urls: vec!["https://override".into()],
            ..Default::default()
        });
        let forwarder = Forwarder::new(sink.clone(), "https://main", Some("https://override".into()));

        assert!(!forwarder.alert_correction(&correction()).await);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_forward_error() {
        let sink = Arc::new(RecordingSink {
            fail_urls: vec!["https://main".into()],
            ..Default::default()
        });
        let forwarder = Forwarder::new(sink, "https://main", None);

        let err = forwarder.forward(&WebhookPayload::default()).await.unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)));
    }
}
