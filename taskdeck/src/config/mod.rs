//! Configuration system for the `TaskDeck` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::filter::FilterMode;

/// Errors that can occur when loading configuration.
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

    /// The `default_filter` value in the file is not a known filter name.
    #[error("invalid default_filter in config: {0}")]
    InvalidFilter(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    list: ListFileConfig,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    url: Option<String>,
    connect_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// `[list]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ListFileConfig {
    default_filter: Option<String>,
    date_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Connection parameters for the remote document store.
#[derive(Debug, Clone)]
pub struct StoreConnection {
    /// WebSocket URL of the store endpoint.
    pub url: String,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Timeout for each in-flight request.
    pub request_timeout: Duration,
}

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Store --
    /// Remote store WebSocket URL. `None` selects the in-memory demo store.
    pub store_url: Option<String>,
    /// Signed-in user identity string.
    pub user: Option<String>,
    /// Timeout for connecting to the store.
    pub connect_timeout: Duration,
    /// Timeout for each store request.
    pub request_timeout: Duration,

    // -- List --
    /// Filter applied when `list` is run without an explicit filter.
    pub default_filter: FilterMode,
    /// Due-date display format string (chrono).
    pub date_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            user: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            default_filter: FilterMode::All,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// CLI args and env vars are parsed via `clap`. If `--config` is given
    /// and the file does not exist, returns an error. If no `--config` is
    /// given, the default path (`~/.config/taskdeck/config.toml`) is tried
    /// and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the file's `default_filter` is not a known name.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. This is separated from `load()` to
    /// enable unit testing without CLI parsing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_filter = match (&cli.filter, &file.list.default_filter) {
            (Some(value), _) | (None, Some(value)) => value
                .parse::<FilterMode>()
                .map_err(|_| ConfigError::InvalidFilter(value.clone()))?,
            (None, None) => defaults.default_filter,
        };

        Ok(Self {
            store_url: cli.store_url.clone().or_else(|| file.store.url.clone()),
            user: cli.user.clone(),
            connect_timeout: file
                .store
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            request_timeout: file
                .store
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            default_filter,
            date_format: file
                .list
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
        })
    }

    /// Build a [`StoreConnection`] from this configuration, if a store URL
    /// is present.
    ///
    /// Returns `None` when no URL is configured or the URL is empty
    /// (offline demo mode).
    #[must_use]
    pub fn store_connection(&self) -> Option<StoreConnection> {
        let url = self.store_url.clone()?;
        if url.is_empty() {
            return None;
        }
        Some(StoreConnection {
            url,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        })
    }
}

/// CLI arguments parsed by clap.
///
/// Environment variables are supported via `env` attributes so scripted
/// invocations can avoid repeating flags.
#[derive(clap::Args, Debug, Default)]
pub struct CliArgs {
    /// WebSocket URL of the remote document store.
    #[arg(long, env = "TASKDECK_STORE_URL")]
    pub store_url: Option<String>,

    /// User identity to operate as.
    #[arg(long, env = "TASKDECK_USER")]
    pub user: Option<String>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Default list filter (all, active, completed).
    #[arg(long)]
    pub filter: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdeck.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available — use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdeck").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
