//! Configuration for the server and client binaries.
//!
//! Supports command-line arguments and an optional TOML file; CLI arguments
//! take precedence over file values.

use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Command-line arguments for the tally server.
#[derive(Parser, Debug)]
#[command(name = "wordtally-server")]
#[command(version = "0.1.0")]
#[command(about = "Collects word and character frequency statistics over TCP", long_about = None)]
pub struct ServerArgs {
    /// Address to bind to
    pub address: IpAddr,

    /// Port to bind to
    pub port: u16,

    /// Listen backlog (positive)
    #[arg(short = 'b', long, value_parser = clap::value_parser!(i32).range(1..))]
    pub backlog: i32,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the tally client.
#[derive(Parser, Debug)]
#[command(name = "wordtally-client")]
#[command(version = "0.1.0")]
#[command(about = "Streams words from a file to a tally server", long_about = None)]
pub struct ClientArgs {
    /// Server address to connect to
    pub address: IpAddr,

    /// Server port to connect to
    pub port: u16,

    /// Input file to tokenize into words
    pub file: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum inter-word delay in milliseconds
    #[arg(long)]
    pub min_delay_ms: Option<u64>,

    /// Maximum inter-word delay in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientSection {
    /// Minimum inter-word delay in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Maximum inter-word delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_max_connections() -> usize {
    1024
}

fn default_min_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    1500
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub backlog: i32,
    pub max_connections: usize,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(ServerArgs::parse())
    }

    pub fn resolve(cli: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = load_toml(cli.config.as_deref())?;

        Ok(Self {
            addr: SocketAddr::new(cli.address, cli.port),
            backlog: cli.backlog,
            max_connections: cli
                .max_connections
                .unwrap_or(toml_config.server.max_connections),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Final resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub addr: SocketAddr,
    pub file: PathBuf,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(ClientArgs::parse())
    }

    pub fn resolve(cli: ClientArgs) -> Result<Self, ConfigError> {
        let toml_config = load_toml(cli.config.as_deref())?;

        let min_delay_ms = cli.min_delay_ms.unwrap_or(toml_config.client.min_delay_ms);
        let max_delay_ms = cli.max_delay_ms.unwrap_or(toml_config.client.max_delay_ms);

        if max_delay_ms < min_delay_ms {
            return Err(ConfigError::InvalidPacing {
                min_delay_ms,
                max_delay_ms,
            });
        }

        Ok(Self {
            addr: SocketAddr::new(cli.address, cli.port),
            file: cli.file,
            min_delay_ms,
            max_delay_ms,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

fn load_toml(path: Option<&std::path::Path>) -> Result<TomlConfig, ConfigError> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
            toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
        }
        None => Ok(TomlConfig::default()),
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {1}", .0.display())]
    FileRead(PathBuf, std::io::Error),

    #[error("failed to parse config file '{}': {1}", .0.display())]
    TomlParse(PathBuf, toml::de::Error),

    #[error("max delay {max_delay_ms}ms is below min delay {min_delay_ms}ms")]
    InvalidPacing { min_delay_ms: u64, max_delay_ms: u64 },
}
