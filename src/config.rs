//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides; command
//! line flags are applied on top by the binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::hub::HubConfig;
use crate::normalize::LogFormat;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve the UI from this directory instead of the built-in page
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    #[serde(default = "default_keep_alive")]
    pub sse_keep_alive_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_keep_alive() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            sse_keep_alive_secs: default_keep_alive(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Input stream configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    /// Structured format to normalize lines from
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Pretty,
    Json,
}

impl LogOutput {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogOutput::Pretty),
            "json" => Some(LogOutput::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub output: LogOutput,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: LogOutput::default(),
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

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Default config file locations, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("leno").join("config.toml")),
            Some(PathBuf::from("/etc/leno/config.toml")),
            Some(PathBuf::from("./leno.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// First default location that exists
    pub fn find_default() -> Option<PathBuf> {
        Self::default_paths().into_iter().find(|p| p.exists())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = lookup("LENO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LENO_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "LENO_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = lookup("LENO_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        // Input overrides
        if let Some(format) = lookup("LENO_INPUT_FORMAT") {
            self.input.format =
                LogFormat::from_name(&format).ok_or_else(|| ConfigError::InvalidEnv {
                    key: "LENO_INPUT_FORMAT",
                    value: format.clone(),
                })?;
        }

        // Logging overrides
        if let Some(level) = lookup("LENO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(output) = lookup("LENO_LOG_OUTPUT") {
            self.logging.output =
                LogOutput::from_name(&output).ok_or_else(|| ConfigError::InvalidEnv {
                    key: "LENO_LOG_OUTPUT",
                    value: output.clone(),
                })?;
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# leno configuration
#
# Environment variables override these settings:
# - LENO_HOST
# - LENO_PORT
# - LENO_STATIC_DIR
# - LENO_INPUT_FORMAT
# - LENO_LOG_LEVEL
# - LENO_LOG_OUTPUT

[server]
# Address to bind to
host = "0.0.0.0"

# Port to listen on
port = 3000

# Directory with a custom UI (default: built-in page)
# static_dir = "/usr/share/leno/public"

# Seconds between SSE keep-alive comments
sse_keep_alive_secs = 15

[hub]
# Records buffered per viewer; a viewer that falls further behind misses lines
queue_capacity = 16

[input]
# Structured format of the input lines: none, logfmt or nginx
format = "none"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log output: pretty (for development) or json (for production)
output = "pretty"
"#
    .to_string()
}
