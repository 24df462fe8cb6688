//! Storage Layer
//!
//! Read-only SQLite access to the `measurement` and `station` tables.
//! A [`ClimateStore`] is opened once per process; each request borrows a
//! [`Session`] from it and releases it when done.

mod config;
mod period;
mod session;
mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::StorageConfig;
pub use period::{one_year_before, DATE_FORMAT};
pub use session::{
    PrecipitationRecord, Session, StationActivity, StationRecord, TemperatureRecord,
    TemperatureSummary,
};
pub use store::ClimateStore;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot open database at {location}: {source}")]
    Connection {
        location: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Invalid date in dataset: {0}")]
    InvalidDate(String),
}
