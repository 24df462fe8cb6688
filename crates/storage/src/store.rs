//! Process-wide connection pool

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Session, StorageConfig, StorageError};

/// Handle on the climate database.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Debug, Clone)]
pub struct ClimateStore {
    pool: SqlitePool,
}

impl ClimateStore {
    /// Open a pool against the configured database.
    ///
    /// The file is never created. One connection is opened up front so an
    /// unreachable or malformed location fails here rather than on the
    /// first request.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let location = config.database_url.as_str();
        let connection_error = |source| StorageError::Connection {
            location: location.to_string(),
            source,
        };

        let options = if location.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(location).map_err(connection_error)?
        } else {
            SqliteConnectOptions::new().filename(location)
        };
        let options = options
            .create_if_missing(false)
            .read_only(config.read_only);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(connection_error)?;

        info!(
            "Opened climate database at {} (max {} connections, read_only={})",
            location, config.max_connections, config.read_only
        );

        Ok(Self { pool })
    }

    /// Wrap an already configured pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Borrow a private query context for one request
    pub async fn session(&self) -> Result<Session, StorageError> {
        let conn = self.pool.acquire().await?;
        debug!("Session opened");
        Ok(Session::new(conn))
    }

    /// Wait for outstanding sessions and close every connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Climate database closed");
    }
}
