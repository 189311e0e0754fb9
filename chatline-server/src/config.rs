//! Configuration system for the chatline server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/chatline/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    db_path: Option<PathBuf>,
    max_frame_size: Option<usize>,
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the chatline server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Chatline server")]
pub struct CliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "CHATLINE_ADDR")]
    pub bind: Option<String>,

    /// Path to the SQLite database file.
    #[arg(short, long, env = "CHATLINE_DB")]
    pub db: Option<PathBuf>,

    /// Path to config file (default: `~/.config/chatline/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum request frame size in bytes.
    #[arg(long)]
    pub max_frame_size: Option<usize>,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "CHATLINE_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:5555`).
    pub bind_addr: String,
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Maximum accepted request frame size in bytes.
    pub max_frame_size: usize,
    /// Optional log file; logs go to stderr when unset.
    pub log_file: Option<PathBuf>,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5555".to_string(),
            db_path: default_db_path(),
            max_frame_size: 1024 * 1024,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and a missing
    /// file is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            db_path: cli
                .db
                .clone()
                .or_else(|| file.server.db_path.clone())
                .unwrap_or(defaults.db_path),
            max_frame_size: cli
                .max_frame_size
                .or(file.server.max_frame_size)
                .unwrap_or(defaults.max_frame_size),
            log_file: cli.log_file.clone().or_else(|| file.server.log_file.clone()),
            log_level: cli.log_level.clone(),
        }
    }
}

/// Default database location: `<data dir>/chatline/chatline.db`, falling
/// back to the working directory when no data dir is known.
fn default_db_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("chatline.db"),
        |dir| dir.join("chatline").join("chatline.db"),
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("chatline").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
