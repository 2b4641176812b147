//! Viewer configuration loading from file and environment variables.

use serde::Deserialize;
use sniffer_query::{Engine, UnknownEngineError};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Capture file settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Filter and refresh settings.
    #[serde(default)]
    pub inspector: InspectorConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// The capture file written by the gRPC interceptors.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Path to the newline-delimited JSON capture file.
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// How long to wait at end of file before reading again.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectorConfig {
    /// Delay between the first change and the refresh it triggers.
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Filter language: `expr` or `keyword`.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Filter applied before the first record arrives.
    #[serde(default)]
    pub initial_filter: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "sniffer_inspect=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8080
}

fn default_capture_path() -> String {
    "grpc_capture.json".to_string()
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_refresh_delay_ms() -> u64 {
    250
}

fn default_engine() -> String {
    "expr".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            path: default_capture_path(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay_ms(),
            engine: default_engine(),
            initial_filter: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl CaptureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl InspectorConfig {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// Resolves the configured filter language.
    pub fn engine(&self) -> Result<Engine, UnknownEngineError> {
        self.engine.parse()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured filter language is not known.
    #[error(transparent)]
    Engine(#[from] UnknownEngineError),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SNIFFER_HOST` overrides `server.host`
/// - `SNIFFER_PORT` overrides `server.port`
/// - `SNIFFER_CAPTURE_FILE` (or `GRPC_JSON_SNIFFER_FILE`) overrides `capture.path`
/// - `SNIFFER_POLL_INTERVAL_MS` overrides `capture.poll_interval_ms`
/// - `SNIFFER_REFRESH_DELAY_MS` overrides `inspector.refresh_delay_ms`
/// - `SNIFFER_ENGINE` overrides `inspector.engine`
/// - `SNIFFER_FILTER` overrides `inspector.initial_filter`
/// - `SNIFFER_LOG_LEVEL` overrides `logging.level`
/// - `SNIFFER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if the resulting engine name is unknown.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    config.inspector.engine()?;
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("SNIFFER_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("SNIFFER_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(path) = lookup("SNIFFER_CAPTURE_FILE").or_else(|| lookup("GRPC_JSON_SNIFFER_FILE")) {
        config.capture.path = path;
    }
    if let Some(interval) = lookup("SNIFFER_POLL_INTERVAL_MS") {
        if let Ok(parsed) = interval.parse() {
            config.capture.poll_interval_ms = parsed;
        }
    }
    if let Some(delay) = lookup("SNIFFER_REFRESH_DELAY_MS") {
        if let Ok(parsed) = delay.parse() {
            config.inspector.refresh_delay_ms = parsed;
        }
    }
    if let Some(engine) = lookup("SNIFFER_ENGINE") {
        config.inspector.engine = engine;
    }
    if let Some(filter) = lookup("SNIFFER_FILTER") {
        config.inspector.initial_filter = Some(filter);
    }
    if let Some(level) = lookup("SNIFFER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("SNIFFER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
