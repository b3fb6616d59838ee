use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::constants::{limits, tvdb};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub discord: DiscordConfig,

    pub tvdb: TvdbConfig,

    pub enrichment: EnrichmentConfig,

    pub observability: ObservabilityConfig,

    /// File the settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format.
    pub json_logs: bool,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            suppress_connection_errors: false,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8700,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Destination for enriched new-episode notifications.
    pub webhook_url: String,

    /// Optional destination for "metadata was corrected" alerts.
    pub override_webhook_url: Option<String>,

    pub request_timeout_seconds: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            override_webhook_url: None,
            request_timeout_seconds: limits::DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl DiscordConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvdbConfig {
    /// Used to absolutize links found on scraped pages.
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for TvdbConfig {
    fn default() -> Self {
        Self {
            base_url: tvdb::BASE_URL.to_string(),
            request_timeout_seconds: limits::DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl TvdbConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// What to do when TheTVDB has nothing for the notified episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMissPolicy {
    /// Drop the notification.
    #[default]
    Ignore,
    /// Forward the notification exactly as received.
    ForwardUnenriched,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub show_episode_thumbnail: bool,

    /// Replace the notified episode title with TheTVDB's when they differ.
    pub correct_titles: bool,

    /// Scrape the episode overview when Sonarr sent none.
    pub backfill_overview: bool,

    /// Follow the series URL redirect before building season page URLs.
    /// When false the inbound URL is trusted as-is.
    pub resolve_series_redirect: bool,

    /// Episodes that first aired longer ago than this are not announced.
    pub release_window_days: u32,

    pub on_lookup_miss: LookupMissPolicy,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            show_episode_thumbnail: true,
            correct_titles: true,
            backfill_overview: true,
            resolve_series_redirect: true,
            release_window_days: limits::DEFAULT_RELEASE_WINDOW_DAYS,
            on_lookup_miss: LookupMissPolicy::Ignore,
        }
    }
}

impl EnrichmentConfig {
    #[must_use]
    pub fn release_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.release_window_days))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "interceptarr".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    /// Loads the first config file found, or defaults, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], but reads `path` when one is given.
    ///
    /// Runs before logging is set up; [`Config::source`] records which file
    /// was used so it can be reported afterwards.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let source = path.map(Path::to_path_buf).or_else(Self::find_config_file);

        let mut config = match &source {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.source = source;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|path| path.exists())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Overrides file values with the variables the relay has always been
    /// configured through.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DISCORD_WEBHOOK_URL").filter(|v| !v.is_empty()) {
            self.discord.webhook_url = url;
        }

        if let Some(url) = lookup("DISCORD_OVERRIDE_WEBHOOK_URL") {
            self.discord.override_webhook_url = Some(url).filter(|v| !v.is_empty());
        }

        if let Some(flag) = lookup("SHOW_EPISODE_THUMBNAIL") {
            self.enrichment.show_episode_thumbnail = parse_flag(&flag)
                .with_context(|| format!("Invalid SHOW_EPISODE_THUMBNAIL value: {flag}"))?;
        }

        if let Some(host) = lookup("WEBHOOK_HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }

        if let Some(port) = lookup("WEBHOOK_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid WEBHOOK_PORT value: {port}"))?;
        }

        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("interceptarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".interceptarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord.webhook_url.is_empty() {
            anyhow::bail!("Discord webhook URL must be set (DISCORD_WEBHOOK_URL)");
        }

        url::Url::parse(&self.discord.webhook_url).context("Invalid Discord webhook URL")?;

        if let Some(url) = &self.discord.override_webhook_url {
            url::Url::parse(url).context("Invalid Discord override webhook URL")?;
        }

        url::Url::parse(&self.tvdb.base_url).context("Invalid TVDB base URL")?;

        if self.enrichment.release_window_days == 0 {
            anyhow::bail!("Release window must be at least one day");
        }

        if self.enrichment.release_window_days > limits::MAX_RELEASE_WINDOW_DAYS {
            anyhow::bail!(
                "Release window must be at most {} days",
                limits::MAX_RELEASE_WINDOW_DAYS
            );
        }

        if self.tvdb.request_timeout_seconds == 0 || self.discord.request_timeout_seconds == 0 {
            anyhow::bail!("Request timeouts must be > 0");
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
