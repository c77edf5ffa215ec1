// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streambot - live-stream companion.
//!
//! Binary entry point: parses the command line, loads configuration and
//! hands over to the selected subcommand.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use streambot_config::{ConfigError, StreambotConfig};

/// Streambot - chat aggregation, text-to-speech and overlays for streams.
#[derive(Parser, Debug)]
#[command(name = "streambot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the bot (the default).
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Validate the configuration and exit.
    Validate,
}

fn load(path: Option<&PathBuf>) -> Result<StreambotConfig, Vec<ConfigError>> {
    match path {
        Some(path) => streambot_config::load_and_validate_path(path),
        None => streambot_config::load_and_validate(),
    }
}

fn render_config(config: &StreambotConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            streambot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => match render_config(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("error: could not render configuration: {e}");
                std::process::exit(1);
            }
        },
        Commands::Config {
            action: ConfigAction::Validate,
        } => {
            println!("streambot: configuration is valid");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["streambot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["streambot", "config", "show", "--config", "/tmp/s.toml"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        );
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }

    #[test]
    fn config_file_is_loaded_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streambot.toml");
        std::fs::write(&path, "[gateway]\nport = 4000\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.gateway.port, 4000);
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streambot.toml");
        std::fs::write(&path, "[gateway]\nprot = 4000\n").unwrap();
        assert!(load(Some(&path)).is_err());
    }

    #[test]
    fn shown_config_loads_back() {
        let config = streambot_config::load_and_validate_str("[tts]\nenabled = false\n").unwrap();
        let text = render_config(&config).unwrap();
        let reloaded = streambot_config::load_and_validate_str(&text).unwrap();
        assert!(!reloaded.tts.enabled);
        assert_eq!(reloaded.gateway.port, config.gateway.port);
    }
}
