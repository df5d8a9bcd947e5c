//! Wastedesk - Waste-collection back-office service
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! wastedesk
//! wastedesk --config configs/config.toml
//!
//! # Generate an ES256 signing key pair
//! wastedesk keygen --out internal/assets/dev/jwt
//!
//! # Seed canonical permissions and the bootstrap admin
//! wastedesk seed
//! ```

mod cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wastedesk_config::{Config, LogConfig, LogFormat, LogOutput};

/// Wastedesk - Waste-collection back-office service
#[derive(Parser, Debug)]
#[command(name = "wastedesk")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,

    /// Generate a P-256 key pair for ES256 tokens
    Keygen(cmd::keygen::KeygenArgs),

    /// Create canonical permissions and roles, then exit
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Keygen(args)) => {
            // Keygen only prints paths
            cmd::keygen::run(args)
        }
        Some(Command::Seed) => {
            init_logging(cli.log_level.as_deref(), cli.config.as_deref())?;
            cmd::seed::run(cli.config).await
        }
        // No subcommand = run server
        Some(Command::Serve) | None => {
            init_logging(cli.log_level.as_deref(), cli.config.as_deref())?;
            cmd::serve::run(cli.config).await
        }
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: Option<&LogConfig>) -> String {
    if let Some(level) = cli_level {
        return level.to_string();
    }

    log.map(|log| log.level.as_str().to_string())
        .unwrap_or_else(|| "info".to_string())
}

/// Log section of the config file, if one was named and parses
fn file_log_config(config_path: Option<&Path>) -> Option<LogConfig> {
    let path = config_path?;
    if !path.exists() {
        return None;
    }
    Config::from_file(path).ok().map(|config| config.log)
}

/// Initialize the tracing subscriber for logging
fn init_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let log = file_log_config(config_path);
    let level = resolve_log_level(cli_level, log.as_ref());
    let log = log.unwrap_or_default();

    let filter = EnvFilter::try_new(&level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match (log.format, log.output) {
        (LogFormat::Json, LogOutput::Stdout) => registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .init(),
        (LogFormat::Json, LogOutput::Stderr) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (LogFormat::Console, LogOutput::Stdout) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
            .init(),
        (LogFormat::Console, LogOutput::Stderr) => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flag_wins() {
        let log = LogConfig::default();
        assert_eq!(resolve_log_level(Some("debug"), Some(&log)), "debug");
    }

    #[test]
    fn test_level_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[log]\nlevel = \"warn\"\n").unwrap();

        let log = file_log_config(Some(&path));
        assert_eq!(resolve_log_level(None, log.as_ref()), "warn");
    }

    #[test]
    fn test_default_level() {
        assert!(file_log_config(Some(Path::new("/nonexistent/config.toml"))).is_none());
        assert_eq!(resolve_log_level(None, None), "info");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["wastedesk", "keygen", "--out", "keys", "--force"]).unwrap();
        match cli.command {
            Some(Command::Keygen(args)) => {
                assert_eq!(args.out, PathBuf::from("keys"));
                assert!(args.force);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["wastedesk", "--log-level", "debug"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
