//! Domain primitives for the relay.
//!
//! Episode coordinates get their own type so a season can never be passed
//! where an episode is expected, and relay results are an enum rather than
//! loose status strings.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Season/episode coordinate of a single episode.
///
/// Parsed from Sonarr's `SxEE` notation and rendered the way TheTVDB lists
/// episodes.
///
/// # Examples
///
/// ```rust
/// use interceptarr::domain::EpisodeCode;
///
/// let code: EpisodeCode = "2x03".parse().unwrap();
/// assert_eq!(code.season(), 2);
/// assert_eq!(code.episode(), 3);
/// assert_eq!(code.to_string(), "S02E03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpisodeCode {
    season: u32,
    episode: u32,
}

impl EpisodeCode {
    #[must_use]
    pub const fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }

    #[must_use]
    pub const fn season(&self) -> u32 {
        self.season
    }

    #[must_use]
    pub const fn episode(&self) -> u32 {
        self.episode
    }
}

impl fmt::Display for EpisodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid episode code '{0}'")]
pub struct InvalidEpisodeCode(pub String);

impl FromStr for EpisodeCode {
    type Err = InvalidEpisodeCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidEpisodeCode(s.to_string());

        let (season, episode) = s.split_once('x').ok_or_else(invalid)?;

        Ok(Self {
            season: parse_component(season).ok_or_else(invalid)?,
            episode: parse_component(episode).ok_or_else(invalid)?,
        })
    }
}

/// Leading zeros are dropped; a component made only of zeros is zero.
fn parse_component(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let stripped = raw.trim_start_matches('0');
    if stripped.is_empty() {
        Some(0)
    } else {
        stripped.parse().ok()
    }
}

/// Why a notification was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Body was not an episode notification we understand.
    Unrecognized,
    /// TheTVDB had no usable row for the episode.
    MetadataNotFound,
    /// The episode first aired before the acceptance window.
    OutsideReleaseWindow,
}

impl IgnoreReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unrecognized => "unrecognized",
            Self::MetadataNotFound => "metadata_not_found",
            Self::OutsideReleaseWindow => "outside_release_window",
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling one inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Forwarded {
        /// HTTP status returned by the destination webhook.
        status: u16,
        /// Whether the payload was repaired with TheTVDB data.
        corrected: bool,
    },
    Ignored(IgnoreReason),
    Failed {
        message: String,
    },
}

impl RelayOutcome {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Forwarded { .. } => "forwarded",
            Self::Ignored(_) => "ignored",
            Self::Failed { .. } => "error",
        }
    }

    #[must_use]
    pub const fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded { .. })
    }
}
