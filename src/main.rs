//! # Himark
//!
//! A console front end for the Himark editor core. It opens a Markdown
//! file, keeps it in sync with the disk and reports changes made by other
//! programs.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start with an untitled document
//! cargo run
//!
//! # Open a file
//! cargo run -- notes/today.md
//!
//! # Print the dark theme as JSON
//! cargo run -- --print-theme --theme dark
//! ```

mod console;
mod session;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use himark_core::{Config, Theme, ThemeMode};

use crate::console::ConsoleHost;
use crate::session::Session;

/// Himark - a Markdown editor that keeps up with the disk
#[derive(Parser, Debug)]
#[command(name = "himark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Theme override (dark or light)
    #[arg(long, value_name = "MODE")]
    theme: Option<ThemeMode>,

    /// Print the selected theme as JSON and exit
    #[arg(long)]
    print_theme: bool,

    /// Write the effective config (with overrides) to the config file and exit
    #[arg(long)]
    write_config: bool,

    /// Do not watch the open file for outside changes
    #[arg(long)]
    no_watch: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            // Writing a fresh config file starts from the defaults
            Some(path) if self.write_config && !path.exists() => Config::default(),
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load(),
        };
        if let Some(mode) = self.theme {
            config.ui.theme = mode;
        }
        if self.no_watch {
            config.files.watch = false;
        }
        Ok(config)
    }

    /// Writes `config` where it would be loaded from next time.
    fn write_config(&self, config: &Config) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => {
                config
                    .save_to(path)
                    .with_context(|| format!("Failed to write config to {}", path.display()))?;
                Ok(path.clone())
            }
            None => {
                config.save().context("Failed to write config")?;
                Ok(Config::default_path()?)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -v when set
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(args.log_level()).into())
                .from_env_lossy(),
        )
        .init();

    tracing::info!("Starting Himark v{}", env!("CARGO_PKG_VERSION"));

    let config = args.load_config()?;

    if args.write_config {
        let path = args.write_config(&config)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    if args.print_theme {
        let theme = Theme::for_mode(config.ui.theme);
        println!("{}", serde_json::to_string_pretty(&theme)?);
        return Ok(());
    }

    let mut session = Session::start(ConsoleHost::stdin(), &config, args.file.clone()).await;
    session.run().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["himark"]);
        assert!(args.file.is_none());
        assert!(!args.no_watch);
        assert_eq!(args.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_args_with_file() {
        let args = Args::parse_from(["himark", "-vv", "notes.md"]);
        assert_eq!(args.file, Some(PathBuf::from("notes.md")));
        assert_eq!(args.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_theme_override() {
        let args = Args::parse_from(["himark", "--theme", "light"]);
        assert_eq!(args.theme, Some(ThemeMode::Light));
        assert!(Args::try_parse_from(["himark", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn test_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();

        let args = Args::parse_from([
            "himark",
            "--config",
            path.to_str().unwrap(),
            "--no-watch",
            "--theme",
            "light",
        ]);
        let config = args.load_config().unwrap();
        assert!(!config.files.watch);
        assert_eq!(config.ui.theme, ThemeMode::Light);
    }

    #[test]
    fn test_write_config_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("himark").join("config.toml");

        let args = Args::parse_from([
            "himark",
            "--config",
            path.to_str().unwrap(),
            "--write-config",
            "--no-watch",
        ]);
        let config = args.load_config().unwrap();

        assert_eq!(args.write_config(&config).unwrap(), path);
        let written = Config::load_from(&path).unwrap();
        assert!(!written.files.watch);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::parse_from(["himark", "--config", "/nonexistent/himark.toml"]);
        assert!(args.load_config().is_err());
    }
}
