//! Storage configuration

use serde::{Deserialize, Serialize};

/// Connection settings for the climate database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `sqlite://` URL or plain path to the database file
    pub database_url: String,

    /// Upper bound on pooled connections
    pub max_connections: u32,

    /// How long a request waits for a free connection (seconds)
    pub acquire_timeout_secs: u64,

    /// Open the database file read-only
    pub read_only: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://Resources/hawaii.sqlite".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            read_only: true,
        }
    }
}
