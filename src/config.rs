//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::SqliteConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

fn default_db_path() -> String {
    "racing_data.db".to_string()
}

fn default_pool_size() -> usize {
    4
}

fn default_query_timeout() -> u64 {
    10_000 // 10 seconds
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
            query_timeout_ms: default_query_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Connection settings for the SQLite store
    pub fn sqlite(&self) -> SqliteConfig {
        SqliteConfig::new(&self.path)
            .pool_size(self.pool_size.max(1))
            .query_timeout_ms(self.query_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether log lines should be emitted as JSON
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `PITWALL_CONFIG`, then default locations, then environment
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(explicit) = std::env::var("PITWALL_CONFIG") {
            let path = PathBuf::from(explicit);
            tracing::info!("Loading config from {:?}", path);
            return Self::load_with_env(&path);
        }

        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("pitwall").join("config.toml")),
            Some(PathBuf::from("/etc/pitwall/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Ok(Self::from_env())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. `PORT` wins over `PITWALL_PORT`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // API overrides
        if let Some(host) = lookup("PITWALL_HOST") {
            self.api.host = host;
        }
        for key in ["PITWALL_PORT", "PORT"] {
            if let Some(port) = parse_override(&lookup, key) {
                self.api.port = port;
            }
        }

        // Database overrides
        if let Some(path) = lookup("PITWALL_DB_PATH") {
            self.database.path = path;
        }
        if let Some(size) = parse_override(&lookup, "PITWALL_DB_POOL_SIZE") {
            self.database.pool_size = size;
        }
        if let Some(ms) = parse_override(&lookup, "PITWALL_QUERY_TIMEOUT_MS") {
            self.database.query_timeout_ms = ms;
        }

        // Logging overrides
        if let Some(level) = lookup("PITWALL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PITWALL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Read and parse a numeric override, ignoring values that don't parse
fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Pitwall Configuration
#
# Environment variables override these settings:
# - PORT (or PITWALL_PORT)
# - PITWALL_HOST
# - PITWALL_DB_PATH
# - PITWALL_DB_POOL_SIZE
# - PITWALL_QUERY_TIMEOUT_MS
# - PITWALL_LOG_LEVEL
# - PITWALL_LOG_FORMAT

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

[database]
# SQLite database file holding races, telemetry, lap_times and tires
path = "racing_data.db"

# Number of pooled read-only connections
pool_size = 4

# Per-query timeout in milliseconds
query_timeout_ms = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
