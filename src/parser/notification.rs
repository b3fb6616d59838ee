//! Decodes Sonarr's Discord-style notification into an [`EpisodeReference`].
//!
//! Sonarr titles its "on import" embed as `Series - SxEE - Episode Title`
//! and links the embed to the series page on TheTVDB.

use crate::constants::embed::OVERVIEW_FIELD;
use crate::domain::{EpisodeCode, InvalidEpisodeCode};
use crate::models::{Embed, EpisodeReference, WebhookPayload};
use thiserror::Error;

const TITLE_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("payload has no embeds")]
    MissingEmbeds,

    #[error("embed {0} has no title")]
    MissingTitle(usize),

    #[error("embed {0} has no url")]
    MissingUrl(usize),

    #[error("embed {index} title '{title}' is not 'Series - SxEE - Title'")]
    MalformedTitle { index: usize, title: String },

    #[error(transparent)]
    InvalidCode(#[from] InvalidEpisodeCode),
}

/// Reads the episode reference out of the first embed.
///
/// Every embed has to look like an episode notification; a payload with any
/// other kind of embed (test events, grabs, health warnings) is rejected.
pub fn parse_notification(payload: &WebhookPayload) -> Result<EpisodeReference, ParseError> {
    let embeds = payload
        .embeds
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(ParseError::MissingEmbeds)?;

    let mut references = embeds
        .iter()
        .enumerate()
        .map(|(index, embed)| parse_embed(index, embed));

    let first = references.next().ok_or(ParseError::MissingEmbeds)??;
    for rest in references {
        rest?;
    }

    Ok(first)
}

fn parse_embed(index: usize, embed: &Embed) -> Result<EpisodeReference, ParseError> {
    let title = embed
        .title
        .as_deref()
        .ok_or(ParseError::MissingTitle(index))?;
    let url = embed.url.as_deref().ok_or(ParseError::MissingUrl(index))?;

    let parts: Vec<&str> = title.split(TITLE_SEPARATOR).collect();
    let &[series, raw_code, episode_title] = parts.as_slice() else {
        return Err(ParseError::MalformedTitle {
            index,
            title: title.to_string(),
        });
    };

    let code: EpisodeCode = raw_code.parse()?;

    Ok(EpisodeReference {
        series_title: series.to_string(),
        code,
        raw_code: raw_code.to_string(),
        notified_title: episode_title.to_string(),
        source_url: url.to_string(),
        existing_overview: embed
            .field_value(OVERVIEW_FIELD)
            .unwrap_or_default()
            .to_string(),
        embed_index: index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> WebhookPayload {
        serde_json::from_value(value).unwrap()
    }

    fn episode_embed(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "url": "https://thetvdb.com/?tab=series&id=121361",
            "fields": [
                {"name": "Quality", "value": "WEBDL-1080p", "inline": true},
                {"name": "Overview", "value": "Jon heads north.", "inline": false}
            ]
        })
    }

    #[test]
    fn test_standard_notification() {
        let p = payload(json!({"embeds": [episode_embed("Game of Thrones - 01x03 - Lord Snow")]}));
        let r = parse_notification(&p).unwrap();

        assert_eq!(r.series_title, "Game of Thrones");
        assert_eq!(r.code, EpisodeCode::new(1, 3));
        assert_eq!(r.raw_code, "01x03");
        assert_eq!(r.notified_title, "Lord Snow");
        assert_eq!(r.source_url, "https://thetvdb.com/?tab=series&id=121361");
        assert_eq!(r.existing_overview, "Jon heads north.");
        assert_eq!(r.embed_index, 0);
        assert_eq!(r.full_title("Lord Snow"), "Game of Thrones - 01x03 - Lord Snow");
    }

    #[test]
    fn test_missing_overview_is_empty() {
        let p = payload(json!({"embeds": [{
            "title": "Show - 2x10 - TBA",
            "url": "https://thetvdb.com/series/show",
            "fields": [{"name": "Quality", "value": "HDTV-720p"}]
        }]}));
        let r = parse_notification(&p).unwrap();
        assert_eq!(r.existing_overview, "");
    }

    #[test]
    fn test_no_embeds() {
        assert_eq!(
            parse_notification(&payload(json!({"eventType": "Test"}))),
            Err(ParseError::MissingEmbeds)
        );
        assert_eq!(
            parse_notification(&payload(json!({"embeds": []}))),
            Err(ParseError::MissingEmbeds)
        );
    }

    #[test]
    fn test_title_with_wrong_part_count() {
        for title in [
            "Show - 1x01",
            "Show 1x01 Pilot",
            "Show - 1x01 - Pilot - Part 1",
            "Spider-Man - 1x01 - Pilot - Again",
        ] {
            let p = payload(json!({"embeds": [episode_embed(title)]}));
            assert!(
                matches!(parse_notification(&p), Err(ParseError::MalformedTitle { .. })),
                "{title} should be rejected"
            );
        }
    }

    #[test]
    fn test_hyphen_without_spaces_is_not_a_separator() {
        let p = payload(json!({"embeds": [episode_embed("Spider-Man - 1x01 - The Pilot")]}));
        let r = parse_notification(&p).unwrap();
        assert_eq!(r.series_title, "Spider-Man");
    }

    #[test]
    fn test_bad_code() {
        let p = payload(json!({"embeds": [episode_embed("Show - S01E01 - Pilot")]}));
        assert!(matches!(
            parse_notification(&p),
            Err(ParseError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_any_bad_embed_rejects_payload() {
        let p = payload(json!({"embeds": [
            episode_embed("Show - 1x01 - Pilot"),
            episode_embed("Health check failed")
        ]}));
        assert!(matches!(
            parse_notification(&p),
            Err(ParseError::MalformedTitle { index: 1, .. })
        ));
    }

    #[test]
    fn test_missing_url() {
        let p = payload(json!({"embeds": [{"title": "Show - 1x01 - Pilot"}]}));
        assert_eq!(parse_notification(&p), Err(ParseError::MissingUrl(0)));
    }
}
