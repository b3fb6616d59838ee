//! Metadata lookups behind a narrow trait.
//!
//! Reconciliation only ever talks to [`EpisodeMetadataSource`]. Lookups never
//! fail from the caller's point of view: transport and parse errors are
//! logged here and come back as absence.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::clients::TvdbClient;
use crate::domain::EpisodeCode;
use crate::models::EpisodeMetadata;

#[async_trait]
pub trait EpisodeMetadataSource: Send + Sync {
    /// Canonical form of a series link. Falls back to the link itself.
    async fn resolve_series_url(&self, url: &str) -> String;

    /// Air date, detail page and canonical title for an episode.
    async fn lookup_episode(
        &self,
        series_title: &str,
        code: EpisodeCode,
        series_url: &str,
    ) -> Option<EpisodeMetadata>;

    async fn fetch_thumbnail(&self, detail_url: &str) -> Option<String>;

    async fn fetch_overview(&self, detail_url: &str) -> Option<String>;
}

/// [`EpisodeMetadataSource`] backed by scraping TheTVDB.
pub struct TvdbMetadataSource {
    client: TvdbClient,
}

impl TvdbMetadataSource {
    #[must_use]
    pub const fn new(client: TvdbClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EpisodeMetadataSource for TvdbMetadataSource {
    async fn resolve_series_url(&self, url: &str) -> String {
        match self.client.resolve_series_url(url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(url = %url, error = %e, "Could not resolve series URL, using it as-is");
                url.to_string()
            }
        }
    }

    async fn lookup_episode(
        &self,
        series_title: &str,
        code: EpisodeCode,
        series_url: &str,
    ) -> Option<EpisodeMetadata> {
        info!(series = %series_title, episode = %code, "Searching TVDB");

        match self.client.find_episode(series_url, code).await {
            Ok(Some(metadata)) => {
                info!(
                    episode = %code,
                    air_date = %metadata.air_date,
                    "Found first aired date"
                );
                Some(metadata)
            }
            Ok(None) => {
                warn!(series = %series_title, episode = %code, "Episode data not found");
                None
            }
            Err(e) => {
                error!(series = %series_title, episode = %code, error = %e, "Error fetching episode data from TVDB");
                None
            }
        }
    }

    async fn fetch_thumbnail(&self, detail_url: &str) -> Option<String> {
        match self.client.episode_thumbnail(detail_url).await {
            Ok(Some(url)) => {
                info!(thumbnail = %url, "Episode thumbnail URL found");
                Some(url)
            }
            Ok(None) => {
                info!("Episode thumbnail not found");
                None
            }
            Err(e) => {
                error!(url = %detail_url, error = %e, "Error fetching episode thumbnail");
                None
            }
        }
    }

    async fn fetch_overview(&self, detail_url: &str) -> Option<String> {
        match self.client.episode_overview(detail_url).await {
            Ok(Some(overview)) => Some(overview),
            Ok(None) => {
                info!("Episode overview not found");
                None
            }
            Err(e) => {
                error!(url = %detail_url, error = %e, "Error fetching episode overview");
                None
            }
        }
    }
}
