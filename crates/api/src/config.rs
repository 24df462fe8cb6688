//! Server configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CLIMATE_API_*` environment variables (`__` separates nested keys, e.g.
//! `CLIMATE_API_SERVER__BIND_ADDR`).

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use storage::StorageConfig;

use crate::ConfigError;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_VAR: &str = "CLIMATE_API_CONFIG";

/// Config file read when `CLIMATE_API_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "climate-api.toml";

const ENV_PREFIX: &str = "CLIMATE_API";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: String,

    /// Allow cross-origin requests from anywhere
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            permissive_cors: false,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,

    /// Emit one JSON object per line
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from the config file (if any) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Parse settings from TOML text, defaults filling the gaps
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}
