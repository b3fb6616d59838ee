//! Merges TheTVDB data into a Sonarr notification.
//!
//! Sonarr often imports a fresh episode before its metadata has settled, so
//! the notification may carry a placeholder title ("TBA", "Episode 3") and no
//! overview. This is where those get repaired and the embed is reshaped into
//! the new-episode announcement.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;

use crate::config::EnrichmentConfig;
use crate::constants::embed::{
    NEW_EPISODE_AUTHOR, NEW_EPISODE_COLOR, OVERVIEW_FIELD, RELEASED_FIELD,
};
use crate::models::{
    Correction, Embed, EmbedAuthor, EmbedField, EmbedImage, EpisodeMetadata, EpisodeReference,
};
use crate::services::EpisodeMetadataSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The episode aired before the acceptance window; nothing was changed.
    OutsideWindow,
    /// The embed was rewritten. Carries what was repaired, if anything.
    Enriched { correction: Option<Correction> },
}

/// True when the episode's air date (midnight UTC) is strictly newer than
/// `now - window`. Future air dates are inside the window, and so is
/// everything when the cutoff lies before the earliest representable date.
#[must_use]
pub fn within_release_window(
    air_date: NaiveDate,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> bool {
    now.checked_sub_signed(window)
        .is_none_or(|cutoff| air_date.and_time(NaiveTime::MIN).and_utc() > cutoff)
}

pub struct Reconciler<'a> {
    source: &'a dyn EpisodeMetadataSource,
    settings: &'a EnrichmentConfig,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub const fn new(source: &'a dyn EpisodeMetadataSource, settings: &'a EnrichmentConfig) -> Self {
        Self { source, settings }
    }

    pub async fn reconcile(
        &self,
        reference: &EpisodeReference,
        metadata: &EpisodeMetadata,
        embed: &mut Embed,
        now: DateTime<Utc>,
    ) -> Reconciliation {
        if !within_release_window(metadata.air_date, now, self.settings.release_window()) {
            info!(
                air_date = %metadata.air_date,
                "First aired date is not within the release window, ignoring"
            );
            return Reconciliation::OutsideWindow;
        }

        info!(air_date = %metadata.air_date, "First aired date is within the release window");

        let mut corrected_title = reference.notified_title.clone();
        let mut title_replaced = false;

        if self.settings.correct_titles
            && let Some(canonical) = metadata.canonical_title.as_deref()
            && canonical != reference.notified_title
        {
            info!(
                notified = %reference.notified_title,
                canonical = %canonical,
                "Episode title from Sonarr is improper, updating"
            );
            embed.title = Some(reference.full_title(canonical));
            corrected_title = canonical.to_string();
            title_replaced = true;
        }

        let mut overview = reference.existing_overview.clone();
        let mut overview_backfilled = false;

        if overview.is_empty() && self.settings.backfill_overview {
            info!("Episode overview missing from Sonarr, fetching from TVDB");

            let fetched = match &metadata.overview {
                Some(known) => Some(known.clone()),
                None => self.source.fetch_overview(&metadata.detail_url).await,
            };

            if let Some(fetched) = fetched.filter(|o| !o.is_empty()) {
                overview = fetched;
                overview_backfilled = true;
            }
        }

        embed.fields = vec![
            EmbedField::new(RELEASED_FIELD, metadata.air_date_raw.clone(), true),
            EmbedField::new(OVERVIEW_FIELD, overview, false),
        ];
        embed.author = Some(EmbedAuthor::named(NEW_EPISODE_AUTHOR));
        embed.description = Some(String::new());
        embed.color = Some(NEW_EPISODE_COLOR);

        if self.settings.show_episode_thumbnail {
            let thumbnail = match &metadata.thumbnail_url {
                Some(known) => Some(known.clone()),
                None => self.source.fetch_thumbnail(&metadata.detail_url).await,
            };

            if let Some(url) = thumbnail {
                embed.image = Some(EmbedImage { url });
            }
        }

        let correction = (title_replaced || overview_backfilled).then(|| Correction {
            original_title: reference.notified_title.clone(),
            full_title: reference.full_title(&corrected_title),
            corrected_title,
            detail_url: metadata.detail_url.clone(),
            title_replaced,
            overview_backfilled,
        });

        Reconciliation::Enriched { correction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeCode;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubSource {
        overview: Option<String>,
        thumbnail: Option<String>,
        overview_calls: AtomicUsize,
        thumbnail_calls: AtomicUsize,
    }

    #[async_trait]
    impl EpisodeMetadataSource for StubSource {
        async fn resolve_series_url(&self, url: &str) -> String {
            url.to_string()
        }

        async fn lookup_episode(
            &self,
            _series_title: &str,
            _code: EpisodeCode,
            _series_url: &str,
        ) -> Option<EpisodeMetadata> {
            None
        }

        async fn fetch_thumbnail(&self, _detail_url: &str) -> Option<String> {
            self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
            self.thumbnail.clone()
        }

        async fn fetch_overview(&self, _detail_url: &str) -> Option<String> {
            self.overview_calls.fetch_add(1, Ordering::SeqCst);
            self.overview.clone()
        }
    }

    fn reference(title: &str, overview: &str) -> EpisodeReference {
        EpisodeReference {
            series_title: "Show".into(),
            code: EpisodeCode::new(2, 3),
            raw_code: "2x03".into(),
            notified_title: title.into(),
            source_url: "https://thetvdb.com/series/show".into(),
            existing_overview: overview.into(),
            embed_index: 0,
        }
    }

    fn metadata(title: &str) -> EpisodeMetadata {
        EpisodeMetadata {
            air_date_raw: "March 02, 2024".into(),
            air_date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            canonical_title: Some(title.into()),
            detail_url: "https://thetvdb.com/x".into(),
            overview: None,
            thumbnail_url: None,
        }
    }

    fn aired_plus(offset: Duration) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap() + offset
    }

    fn embed() -> Embed {
        Embed {
            title: Some("Show - 2x03 - TBA".into()),
            url: Some("https://thetvdb.com/series/show".into()),
            description: Some("Imported".into()),
            fields: vec![EmbedField::new("Quality", "WEBDL-1080p", true)],
            ..Default::default()
        }
    }

    #[test]
    fn test_window_boundary() {
        let aired = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let week = Duration::days(7);

        assert!(within_release_window(aired, aired_plus(Duration::hours(6 * 24 + 23)), week));
        assert!(!within_release_window(aired, aired_plus(Duration::days(7)), week));
        assert!(!within_release_window(
            aired,
            aired_plus(Duration::days(7) + Duration::seconds(1)),
            week
        ));
        assert!(within_release_window(aired, aired_plus(Duration::days(-3)), week));
    }

    #[test]
    fn test_window_wider_than_calendar() {
        let aired = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let settings = EnrichmentConfig {
            release_window_days: u32::MAX,
            ..EnrichmentConfig::default()
        };

        assert!(within_release_window(
            aired,
            aired_plus(Duration::zero()),
            settings.release_window()
        ));
    }

    #[tokio::test]
    async fn test_outside_window_leaves_embed_alone() {
        let source = StubSource::default();
        let settings = EnrichmentConfig::default();
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", ""),
                &metadata("Real"),
                &mut e,
                aired_plus(Duration::days(8)),
            )
            .await;

        assert_eq!(result, Reconciliation::OutsideWindow);
        assert_eq!(e, embed());
        assert_eq!(source.overview_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_title_replaced() {
        let source = StubSource::default();
        let settings = EnrichmentConfig::default();
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", "Already known."),
                &metadata("The Real Title"),
                &mut e,
                aired_plus(Duration::days(1)),
            )
            .await;

        let Reconciliation::Enriched {
            correction: Some(correction),
        } = &result
        else {
            panic!("expected a correction, got {result:?}");
        };

        assert!(correction.title_replaced);
        assert!(!correction.overview_backfilled);
        assert_eq!(correction.original_title, "TBA");
        assert_eq!(correction.corrected_title, "The Real Title");
        assert_eq!(correction.full_title, "Show - 2x03 - The Real Title");
        assert_eq!(e.title.as_deref(), Some("Show - 2x03 - The Real Title"));
        assert_eq!(e.field_value("Overview"), Some("Already known."));
        assert_eq!(source.overview_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embed_reshaped() {
        let source = StubSource {
            thumbnail: Some("https://artworks.thetvdb.com/e.jpg".into()),
            ..Default::default()
        };
        let settings = EnrichmentConfig::default();
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", "Known."),
                &metadata("TBA"),
                &mut e,
                aired_plus(Duration::hours(2)),
            )
            .await;

        assert_eq!(result, Reconciliation::Enriched { correction: None });
        assert_eq!(
            e.fields,
            vec![
                EmbedField::new("Released", "March 02, 2024", true),
                EmbedField::new("Overview", "Known.", false),
            ]
        );
        assert_eq!(e.author.unwrap().name, "New Episode Now Available");
        assert_eq!(e.description.as_deref(), Some(""));
        assert_eq!(e.color, Some(0x2ECB6F));
        assert_eq!(e.image.unwrap().url, "https://artworks.thetvdb.com/e.jpg");
        assert_eq!(e.title.as_deref(), Some("Show - 2x03 - TBA"));
    }

    #[tokio::test]
    async fn test_overview_backfilled() {
        let source = StubSource {
            overview: Some("Fetched overview.".into()),
            ..Default::default()
        };
        let settings = EnrichmentConfig::default();
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", ""),
                &metadata("TBA"),
                &mut e,
                aired_plus(Duration::days(2)),
            )
            .await;

        let Reconciliation::Enriched {
            correction: Some(correction),
        } = &result
        else {
            panic!("expected a correction, got {result:?}");
        };

        assert!(correction.overview_backfilled);
        assert!(!correction.title_replaced);
        assert_eq!(correction.original_title, correction.corrected_title);
        assert_eq!(e.field_value("Overview"), Some("Fetched overview."));
    }

    #[tokio::test]
    async fn test_failed_backfill_is_not_a_correction() {
        let source = StubSource::default();
        let settings = EnrichmentConfig::default();
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", ""),
                &metadata("TBA"),
                &mut e,
                aired_plus(Duration::days(2)),
            )
            .await;

        assert_eq!(result, Reconciliation::Enriched { correction: None });
        assert_eq!(e.field_value("Overview"), Some(""));
        assert_eq!(source.overview_calls.load(Ordering::SeqCst), 1);
        assert!(e.image.is_none());
    }

    #[tokio::test]
    async fn test_toggles_disable_repairs() {
        let source = StubSource {
            overview: Some("Fetched.".into()),
            thumbnail: Some("https://artworks.thetvdb.com/e.jpg".into()),
            ..Default::default()
        };
        let settings = EnrichmentConfig {
            correct_titles: false,
            backfill_overview: false,
            show_episode_thumbnail: false,
            ..Default::default()
        };
        let mut e = embed();

        let result = Reconciler::new(&source, &settings)
            .reconcile(
                &reference("TBA", ""),
                &metadata("Real"),
                &mut e,
                aired_plus(Duration::days(2)),
            )
            .await;

        assert_eq!(result, Reconciliation::Enriched { correction: None });
        assert_eq!(e.title.as_deref(), Some("Show - 2x03 - TBA"));
        assert!(e.image.is_none());
        assert_eq!(source.overview_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.thumbnail_calls.load(Ordering::SeqCst), 0);
    }
}
