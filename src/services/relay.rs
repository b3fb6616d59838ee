//! One inbound notification, end to end.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{DiscordClient, TvdbClient};
use crate::config::{Config, EnrichmentConfig, LookupMissPolicy};
use crate::domain::{IgnoreReason, RelayOutcome};
use crate::models::{Correction, WebhookPayload};
use crate::parser::parse_notification;
use crate::services::reconcile::{Reconciler, Reconciliation};
use crate::services::{EpisodeMetadataSource, Forwarder, TvdbMetadataSource};

/// A notification after enrichment, before delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    Ready {
        payload: WebhookPayload,
        correction: Option<Correction>,
        /// False when the payload is forwarded exactly as received.
        enriched: bool,
    },
    Ignored(IgnoreReason),
}

pub struct RelayService {
    source: Arc<dyn EpisodeMetadataSource>,
    forwarder: Forwarder,
    settings: EnrichmentConfig,
}

impl RelayService {
    #[must_use]
    pub fn new(
        source: Arc<dyn EpisodeMetadataSource>,
        forwarder: Forwarder,
        settings: EnrichmentConfig,
    ) -> Self {
        Self {
            source,
            forwarder,
            settings,
        }
    }

    /// Wires the TheTVDB scraper and Discord client from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let tvdb = TvdbClient::new(&config.tvdb.base_url, config.tvdb.request_timeout())
            .context("Failed to build TVDB client")?;
        let discord = DiscordClient::new(config.discord.request_timeout())
            .context("Failed to build Discord client")?;

        let forwarder = Forwarder::new(
            Arc::new(discord),
            config.discord.webhook_url.clone(),
            config.discord.override_webhook_url.clone(),
        );

        Ok(Self::new(
            Arc::new(TvdbMetadataSource::new(tvdb)),
            forwarder,
            config.enrichment.clone(),
        ))
    }

    pub async fn handle(&self, payload: WebhookPayload) -> RelayOutcome {
        self.handle_at(payload, Utc::now()).await
    }

    pub async fn handle_at(&self, payload: WebhookPayload, now: DateTime<Utc>) -> RelayOutcome {
        let outcome = match self.prepare(payload, now).await {
            Prepared::Ignored(reason) => {
                info!(reason = %reason, "Ignoring webhook data");
                RelayOutcome::Ignored(reason)
            }
            Prepared::Ready {
                payload,
                correction,
                ..
            } => self.deliver(&payload, correction.as_ref()).await,
        };

        metrics::counter!("relay_notifications_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn deliver(
        &self,
        payload: &WebhookPayload,
        correction: Option<&Correction>,
    ) -> RelayOutcome {
        match self.forwarder.forward(payload).await {
            Ok(status) => {
                if let Some(correction) = correction {
                    self.forwarder.alert_correction(correction).await;
                }
                RelayOutcome::Forwarded {
                    status,
                    corrected: correction.is_some(),
                }
            }
            Err(e) => {
                error!(error = %e, "Error notifying Discord");
                RelayOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Runs parsing, lookup and reconciliation without sending anything.
    pub async fn prepare(&self, mut payload: WebhookPayload, now: DateTime<Utc>) -> Prepared {
        let reference = match parse_notification(&payload) {
            Ok(reference) => reference,
            Err(e) => {
                info!(error = %e, "Webhook is not an episode notification");
                return Prepared::Ignored(IgnoreReason::Unrecognized);
            }
        };

        info!(
            series = %reference.series_title,
            episode = %reference.code,
            title = %reference.notified_title,
            "Processing episode"
        );

        let series_url = if self.settings.resolve_series_redirect {
            self.source.resolve_series_url(&reference.source_url).await
        } else {
            reference.source_url.clone()
        };

        let Some(metadata) = self
            .source
            .lookup_episode(&reference.series_title, reference.code, &series_url)
            .await
        else {
            return match self.settings.on_lookup_miss {
                LookupMissPolicy::Ignore => Prepared::Ignored(IgnoreReason::MetadataNotFound),
                LookupMissPolicy::ForwardUnenriched => {
                    warn!(episode = %reference.code, "No TVDB data, forwarding notification unenriched");
                    Prepared::Ready {
                        payload,
                        correction: None,
                        enriched: false,
                    }
                }
            };
        };

        let Some(embed) = payload.embed_mut(reference.embed_index) else {
            return Prepared::Ignored(IgnoreReason::Unrecognized);
        };

        let reconciliation = Reconciler::new(self.source.as_ref(), &self.settings)
            .reconcile(&reference, &metadata, embed, now)
            .await;

        match reconciliation {
            Reconciliation::OutsideWindow => Prepared::Ignored(IgnoreReason::OutsideReleaseWindow),
            Reconciliation::Enriched { correction } => Prepared::Ready {
                payload,
                correction,
                enriched: true,
            },
        }
    }
}
