pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod parser;
pub mod services;

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use cli::{Cli, Commands};
pub use config::Config;
use domain::RelayOutcome;
use models::WebhookPayload;
use services::{Prepared, RelayService};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Reads `.env`, then the config file named on the command line or the
/// first one found on the search path.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Config::load_from(cli.config.as_deref())
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config)?;

    match &config.source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    match cli.command() {
        Commands::Serve => run_server(config).await,
        Commands::Init => cmd_init(),
        Commands::Check => cmd_check(&config),
        Commands::Replay { path, dry_run } => cmd_replay(&config, &path, dry_run).await,
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = if config.general.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("version", env!("CARGO_PKG_VERSION"))?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn install_metrics(
    config: &Config,
) -> anyhow::Result<Option<metrics_exporter_prometheus::PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    info!(
        "Interceptarr v{} starting webhook server...",
        env!("CARGO_PKG_VERSION")
    );

    if config.discord.override_webhook_url.is_none() {
        info!("No override webhook configured, correction alerts are disabled");
    }

    let prometheus_handle = install_metrics(&config)?;
    let state = api::create_app_state(&config, prometheus_handle)?;
    let app = api::router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening for Sonarr webhooks at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with default settings");
        println!("Set discord.webhook_url (or DISCORD_WEBHOOK_URL) before starting");
    } else {
        println!("config.toml already exists, leaving it untouched");
    }
    Ok(())
}

fn cmd_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    println!("Configuration OK");
    println!("  Listen address:     {}", config.server.bind_address());
    println!(
        "  Override webhook:   {}",
        if config.discord.override_webhook_url.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Episode thumbnails: {}",
        config.enrichment.show_episode_thumbnail
    );
    println!(
        "  Release window:     {} days",
        config.enrichment.release_window_days
    );
    println!(
        "  Lookup miss policy: {:?}",
        config.enrichment.on_lookup_miss
    );
    Ok(())
}

async fn cmd_replay(config: &Config, path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload: {}", path.display()))?;
    let payload: WebhookPayload = serde_json::from_str(&body)
        .with_context(|| format!("Payload is not valid JSON: {}", path.display()))?;

    if !dry_run {
        config.validate()?;
    }

    let relay = RelayService::from_config(config)?;

    if dry_run {
        match relay.prepare(payload, Utc::now()).await {
            Prepared::Ready {
                payload,
                correction,
                enriched,
            } => {
                if !enriched {
                    warn!("No metadata found, payload would be forwarded unchanged");
                }
                if let Some(correction) = correction {
                    println!(
                        "Correction: \"{}\" -> \"{}\"",
                        correction.original_title, correction.corrected_title
                    );
                }
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            Prepared::Ignored(reason) => println!("Ignored: {reason}"),
        }
        return Ok(());
    }

    match relay.handle(payload).await {
        RelayOutcome::Forwarded { status, corrected } => {
            println!("Forwarded (HTTP {status}, corrected: {corrected})");
        }
        RelayOutcome::Ignored(reason) => println!("Ignored: {reason}"),
        RelayOutcome::Failed { message } => anyhow::bail!("Forwarding failed: {message}"),
    }

    Ok(())
}
