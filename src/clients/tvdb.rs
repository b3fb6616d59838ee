//! Scraper for TheTVDB's public HTML pages.
//!
//! None of this is a stable API: the season listing is a bootstrap table and
//! the episode page layout is identified by class names. Parsing is kept in
//! free functions so it can be exercised against saved markup.

use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::constants::{USER_AGENT, tvdb};
use crate::domain::EpisodeCode;
use crate::models::EpisodeMetadata;

#[derive(Debug, Error)]
pub enum TvdbError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("could not parse page: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, TvdbError>;

#[derive(Clone)]
pub struct TvdbClient {
    client: Client,
    base_url: Url,
}

impl TvdbClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Fetched TVDB page");

        if !status.is_success() {
            return Err(TvdbError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    /// Follows redirects from a series link and returns where they end.
    ///
    /// Sonarr links series by id (`/?tab=series&id=...`); season pages only
    /// exist under the slug URL TheTVDB redirects to.
    pub async fn resolve_series_url(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let resolved = response.url().to_string();
        debug!(from = %url, to = %resolved, "Resolved series URL");
        Ok(resolved)
    }

    /// Finds an episode on the official-order season listing.
    pub async fn find_episode(
        &self,
        series_url: &str,
        code: EpisodeCode,
    ) -> Result<Option<EpisodeMetadata>> {
        let url = season_url(series_url, code.season());
        info!(url = %url, episode = %code, "Fetching TVDB season page");

        let html = self.fetch_html(&url).await?;
        parse_season_page(&html, code, &self.base_url)
    }

    pub async fn episode_thumbnail(&self, detail_url: &str) -> Result<Option<String>> {
        let html = self.fetch_html(detail_url).await?;
        parse_thumbnail(&html, &self.base_url)
    }

    pub async fn episode_overview(&self, detail_url: &str) -> Result<Option<String>> {
        let html = self.fetch_html(detail_url).await?;
        parse_overview(&html)
    }
}

#[must_use]
pub fn season_url(series_url: &str, season: u32) -> String {
    format!(
        "{}/seasons/official/{}",
        series_url.trim_end_matches('/'),
        season
    )
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| TvdbError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Scans the season table for the row whose first cell is the episode code.
///
/// Rows are `code | <a href=detail>title</a> | air date`. A matching row that
/// lacks a link or a parseable date is treated as no match.
pub fn parse_season_page(
    html: &str,
    code: EpisodeCode,
    base_url: &Url,
) -> Result<Option<EpisodeMetadata>> {
    let document = Html::parse_document(html);
    let table_selector = selector(tvdb::SEASON_TABLE)?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;
    let link_selector = selector("a")?;

    let Some(table) = document.select(&table_selector).next() else {
        info!("Season table not found on TVDB page");
        return Ok(None);
    };

    let expected = code.to_string();

    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        if cells.len() < 3 || text_of(cells[0]) != expected {
            continue;
        }

        let air_date_raw = text_of(cells[2])
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let Ok(air_date) = NaiveDate::parse_from_str(&air_date_raw, tvdb::AIR_DATE_FORMAT) else {
            info!(episode = %expected, air_date = %air_date_raw, "Unrecognized air date");
            return Ok(None);
        };

        let Some(link) = cells[1].select(&link_selector).next() else {
            info!(episode = %expected, "Episode row has no detail link");
            return Ok(None);
        };

        let Some(href) = link.value().attr("href") else {
            return Ok(None);
        };

        let title = text_of(link);

        return Ok(Some(EpisodeMetadata {
            air_date_raw,
            air_date,
            canonical_title: Some(title).filter(|t| !t.is_empty()),
            detail_url: base_url.join(href)?.to_string(),
            overview: None,
            thumbnail_url: None,
        }));
    }

    info!(episode = %expected, "Episode not listed on TVDB season page");
    Ok(None)
}

/// Image link from the episode page's artwork column, unless TheTVDB is
/// showing its "missing episode" placeholder.
pub fn parse_thumbnail(html: &str, base_url: &Url) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let region_selector = selector(tvdb::THUMBNAIL_REGION)?;
    let img_selector = selector("img")?;
    let link_selector = selector("a[href]")?;

    let Some(region) = document.select(&region_selector).next() else {
        return Ok(None);
    };

    let placeholder = region
        .select(&img_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .is_none_or(|src| src == tvdb::MISSING_THUMBNAIL);

    if placeholder {
        return Ok(None);
    }

    let Some(href) = region
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
    else {
        return Ok(None);
    };

    Ok(Some(base_url.join(href)?.to_string()))
}

/// English overview paragraph from an episode page.
pub fn parse_overview(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let overview_selector = selector(tvdb::OVERVIEW)?;

    Ok(document
        .select(&overview_selector)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty()))
}
