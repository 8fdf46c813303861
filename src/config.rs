//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::store::StoreConfig as ClientStoreConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default = "default_sites_table")]
    pub sites_table: String,

    #[serde(default = "default_readings_table")]
    pub readings_table: String,

    #[serde(default = "default_thresholds_table")]
    pub thresholds_table: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://app.nocodb.com/api/v1/db/data/noco".to_string()
}

fn default_sites_table() -> String {
    "Campings".to_string()
}

fn default_readings_table() -> String {
    "Releves de compteurs".to_string()
}

fn default_thresholds_table() -> String {
    "Seuils".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            sites_table: default_sites_table(),
            readings_table: default_readings_table(),
            thresholds_table: default_thresholds_table(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl StoreConfig {
    /// Settings for the REST client
    pub fn client_config(&self) -> ClientStoreConfig {
        ClientStoreConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            sites_table: self.sites_table.clone(),
            readings_table: self.readings_table.clone(),
            thresholds_table: self.thresholds_table.clone(),
            request_timeout_ms: self.request_timeout_secs * 1000,
            max_retries: self.max_retries,
        }
    }
}

/// HTTP server configuration
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
    8085
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
    /// Socket address string for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dashboard behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    /// Periodic reload interval in seconds, 0 disables it
    #[serde(default)]
    pub refresh_interval_secs: u64,
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
    /// Install the global tracing subscriber on stderr. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("campmeter={},tower_http=info", self.level))
        });

        let registry = tracing_subscriber::registry().with(filter);
        if self.format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
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

    /// Load an explicit file, or fall back to the default locations
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::load_with_env(path)?;
                tracing::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => Ok(Self::load_default()),
        }
    }

    /// [`Config::resolve`] under a temporary stderr subscriber, for use
    /// before [`LoggingConfig::init`] has run
    pub fn resolve_logged(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_logging_to(path, std::io::stderr)
    }

    fn resolve_logging_to<W>(path: Option<&Path>, writer: W) -> Result<Self, ConfigError>
    where
        W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("campmeter=info"));
        let bootstrap = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .finish();

        tracing::subscriber::with_default(bootstrap, || Self::resolve(path))
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("campmeter").join("config.toml")),
            Some(PathBuf::from("/etc/campmeter/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Check settings that have no usable default
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.token.trim().is_empty() {
            return Err(ConfigError::Missing(
                "store.token (or CAMPMETER_STORE_TOKEN)".to_string(),
            ));
        }
        if self.store.base_url.trim().is_empty() {
            return Err(ConfigError::Missing(
                "store.base_url (or CAMPMETER_STORE_URL)".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Store overrides
        if let Ok(url) = std::env::var("CAMPMETER_STORE_URL") {
            self.store.base_url = url;
        }
        if let Ok(token) = std::env::var("CAMPMETER_STORE_TOKEN") {
            self.store.token = token;
        }

        // API overrides
        if let Ok(host) = std::env::var("CAMPMETER_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("CAMPMETER_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("CAMPMETER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CAMPMETER_LOG_FORMAT") {
            self.logging.format = format;
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

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Campmeter Configuration
#
# Environment variables override these settings:
# - CAMPMETER_STORE_URL
# - CAMPMETER_STORE_TOKEN
# - CAMPMETER_API_HOST
# - CAMPMETER_API_PORT
# - CAMPMETER_LOG_LEVEL
# - CAMPMETER_LOG_FORMAT

[store]
# Base URL of the tabular database, up to the table name
base_url = "https://app.nocodb.com/api/v1/db/data/noco"

# API token sent in the xc-token header
token = ""

# Table names
sites_table = "Campings"
readings_table = "Releves de compteurs"
thresholds_table = "Seuils"

# Request timeout in seconds
request_timeout_secs = 10

# Retries for list requests on transient failures (writes are never retried)
max_retries = 2

[api]
# Dashboard server host
host = "0.0.0.0"

# Dashboard server port
port = 8085

[dashboard]
# Reload data from the store every N seconds (0 = only on demand)
refresh_interval_secs = 0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
