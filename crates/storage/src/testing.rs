//! In-memory fixtures for tests.
//!
//! Builds a single-connection SQLite pool with the same two tables as the
//! production dataset and fills it with the given rows.

use sqlx::sqlite::SqlitePoolOptions;

use crate::{ClimateStore, StationRecord, StorageError};

/// One `measurement` row
#[derive(Debug, Clone)]
pub struct MeasurementFixture {
    pub station: String,
    pub date: String,
    pub prcp: Option<f64>,
    pub tobs: f64,
}

pub fn measurement(station: &str, date: &str, prcp: Option<f64>, tobs: f64) -> MeasurementFixture {
    MeasurementFixture {
        station: station.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

pub fn station(id: &str, name: &str, latitude: f64, longitude: f64, elevation: f64) -> StationRecord {
    StationRecord {
        station: id.to_string(),
        name: name.to_string(),
        latitude,
        longitude,
        elevation,
    }
}

const FLOAT_SCHEMA: [&str; 2] = [
    "CREATE TABLE measurement (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT,
        date TEXT,
        prcp FLOAT,
        tobs FLOAT
    )",
    "CREATE TABLE station (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT,
        name TEXT,
        latitude FLOAT,
        longitude FLOAT,
        elevation FLOAT
    )",
];

// Same tables with whole-number readings, as some exports store them.
const INTEGER_SCHEMA: [&str; 2] = [
    "CREATE TABLE measurement (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT,
        date TEXT,
        prcp INTEGER,
        tobs INTEGER
    )",
    "CREATE TABLE station (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT,
        name TEXT,
        latitude FLOAT,
        longitude FLOAT,
        elevation INTEGER
    )",
];

/// Store backed by a private in-memory database seeded with `stations`
/// and `measurements`, inserted in the order given.
pub async fn seeded_store(
    stations: &[StationRecord],
    measurements: &[MeasurementFixture],
) -> Result<ClimateStore, StorageError> {
    seed(&FLOAT_SCHEMA, stations, measurements).await
}

/// Like [`seeded_store`], but `prcp`, `tobs` and `elevation` are `INTEGER`
/// columns, so whole-number readings are stored as integers.
pub async fn seeded_integer_store(
    stations: &[StationRecord],
    measurements: &[MeasurementFixture],
) -> Result<ClimateStore, StorageError> {
    seed(&INTEGER_SCHEMA, stations, measurements).await
}

async fn seed(
    schema: &[&str],
    stations: &[StationRecord],
    measurements: &[MeasurementFixture],
) -> Result<ClimateStore, StorageError> {
    // Every in-memory connection is its own database, so keep exactly one alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    for ddl in schema {
        sqlx::query(*ddl).execute(&pool).await?;
    }

    for s in stations {
        sqlx::query(
            "INSERT INTO station (station, name, latitude, longitude, elevation) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&s.station)
        .bind(&s.name)
        .bind(s.latitude)
        .bind(s.longitude)
        .bind(s.elevation)
        .execute(&pool)
        .await?;
    }

    for m in measurements {
        sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)")
            .bind(&m.station)
            .bind(&m.date)
            .bind(m.prcp)
            .bind(m.tobs)
            .execute(&pool)
            .await?;
    }

    Ok(ClimateStore::from_pool(pool))
}

/// Store whose database has no tables, so every query fails
pub async fn unseeded_store() -> Result<ClimateStore, StorageError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    Ok(ClimateStore::from_pool(pool))
}
