use crate::domain::EpisodeCode;
use chrono::NaiveDate;

/// Episode identity as announced by the inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeReference {
    pub series_title: String,

    pub code: EpisodeCode,

    /// The `SxEE` token exactly as Sonarr wrote it, reused when rebuilding the title.
    pub raw_code: String,

    pub notified_title: String,

    /// Series page on TheTVDB, taken from the embed `url`.
    pub source_url: String,

    /// Value of the inbound `Overview` field, empty when Sonarr sent none.
    pub existing_overview: String,

    /// Position of the embed this reference was read from.
    pub embed_index: usize,
}

impl EpisodeReference {
    #[must_use]
    pub fn full_title(&self, episode_title: &str) -> String {
        format!(
            "{} - {} - {}",
            self.series_title, self.raw_code, episode_title
        )
    }
}

/// What TheTVDB knows about an episode.
///
/// Only the air date and detail page are guaranteed; everything else depends
/// on how much of the page could be scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMetadata {
    /// Air date as printed on the season page, e.g. `March 02, 2024`.
    pub air_date_raw: String,

    pub air_date: NaiveDate,

    pub canonical_title: Option<String>,

    pub detail_url: String,

    pub overview: Option<String>,

    pub thumbnail_url: Option<String>,
}

/// Repairs made to a notification, reported through the correction alert.
///
/// `original_title` and `corrected_title` are equal when only the overview
/// was backfilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub original_title: String,
    pub corrected_title: String,
    pub full_title: String,
    pub detail_url: String,
    pub title_replaced: bool,
    pub overview_backfilled: bool,
}
