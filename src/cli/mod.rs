//! CLI module - Command-line interface for Interceptarr

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interceptarr - Sonarr to Discord relay
/// Repairs new-episode notifications with TheTVDB data before posting them
#[derive(Parser)]
#[command(name = "interceptarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search paths
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Listen for Sonarr webhooks (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create a default config.toml in the current directory
    Init,

    /// Validate the configuration and print the effective settings
    Check,

    /// Run a saved Sonarr payload through the relay
    Replay {
        /// Path to a JSON file holding the webhook body
        path: PathBuf,

        /// Print the enriched payload instead of posting it
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["interceptarr"]);
        assert_eq!(cli.command(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::parse_from([
            "interceptarr",
            "replay",
            "payload.json",
            "--dry-run",
            "--config",
            "/etc/interceptarr.toml",
        ]);
        assert_eq!(
            cli.command(),
            Commands::Replay {
                path: PathBuf::from("payload.json"),
                dry_run: true
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("/etc/interceptarr.toml")));
    }
}
