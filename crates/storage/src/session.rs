//! Per-request query context and row types

use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::{FromRow, Sqlite};
use tracing::debug;

use crate::StorageError;

/// Row of the `station` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StationRecord {
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// Daily precipitation reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrecipitationRecord {
    pub date: String,
    pub precipitation: Option<f64>,
}

/// Daily temperature observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TemperatureRecord {
    pub date: String,
    pub temperature: f64,
}

/// Aggregate over a set of temperature observations.
///
/// Every field is `None` when no rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, FromRow)]
pub struct TemperatureSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Measurement count for one station
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StationActivity {
    pub station: String,
    pub observations: i64,
}

/// Query context bound to one pooled connection.
///
/// The connection goes back to the pool when the session is closed or
/// dropped, whichever comes first.
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Session {
    pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
        Self { conn }
    }

    /// Most recent measurement date across all stations
    pub async fn latest_date(&mut self) -> Result<Option<String>, StorageError> {
        let date = sqlx::query_scalar::<_, String>(
            "SELECT date FROM measurement ORDER BY date DESC LIMIT 1",
        )
        .fetch_optional(&mut *self.conn)
        .await?;

        debug!("Latest measurement date: {:?}", date);
        Ok(date)
    }

    /// Precipitation on or after `start`, oldest first
    pub async fn precipitation_since(
        &mut self,
        start: &str,
    ) -> Result<Vec<PrecipitationRecord>, StorageError> {
        let rows = sqlx::query_as::<_, PrecipitationRecord>(
            "SELECT date, CAST(prcp AS REAL) AS precipitation FROM measurement \
             WHERE date >= ?1 ORDER BY date",
        )
        .bind(start)
        .fetch_all(&mut *self.conn)
        .await?;

        debug!("Fetched {} precipitation rows since {}", rows.len(), start);
        Ok(rows)
    }

    /// Every station, in table order
    pub async fn stations(&mut self) -> Result<Vec<StationRecord>, StorageError> {
        let rows = sqlx::query_as::<_, StationRecord>(
            "SELECT station, name, CAST(latitude AS REAL) AS latitude, \
             CAST(longitude AS REAL) AS longitude, CAST(elevation AS REAL) AS elevation \
             FROM station",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        debug!("Fetched {} stations", rows.len());
        Ok(rows)
    }

    /// Station with the most measurement rows.
    ///
    /// Ties go to whichever station SQLite returns first.
    pub async fn most_active_station(&mut self) -> Result<Option<StationActivity>, StorageError> {
        let activity = sqlx::query_as::<_, StationActivity>(
            "SELECT station, COUNT(station) AS observations FROM measurement \
             GROUP BY station ORDER BY observations DESC LIMIT 1",
        )
        .fetch_optional(&mut *self.conn)
        .await?;

        debug!("Most active station: {:?}", activity);
        Ok(activity)
    }

    /// Most recent measurement date for one station
    pub async fn latest_date_for_station(
        &mut self,
        station: &str,
    ) -> Result<Option<String>, StorageError> {
        let date = sqlx::query_scalar::<_, String>(
            "SELECT date FROM measurement WHERE station = ?1 ORDER BY date DESC LIMIT 1",
        )
        .bind(station)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(date)
    }

    /// Temperatures for one station on or after `start`, in table order
    pub async fn temperatures_since(
        &mut self,
        station: &str,
        start: &str,
    ) -> Result<Vec<TemperatureRecord>, StorageError> {
        let rows = sqlx::query_as::<_, TemperatureRecord>(
            "SELECT date, CAST(tobs AS REAL) AS temperature FROM measurement \
             WHERE station = ?1 AND date >= ?2",
        )
        .bind(station)
        .bind(start)
        .fetch_all(&mut *self.conn)
        .await?;

        debug!(
            "Fetched {} temperature rows for {} since {}",
            rows.len(),
            station,
            start
        );
        Ok(rows)
    }

    /// Min, max and mean temperature for `start <= date [<= end]`.
    ///
    /// Bounds are compared as text, exactly as given.
    pub async fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureSummary, StorageError> {
        let summary = sqlx::query_as::<_, TemperatureSummary>(
            "SELECT MIN(CAST(tobs AS REAL)) AS min, MAX(CAST(tobs AS REAL)) AS max, \
             AVG(tobs) AS avg FROM measurement \
             WHERE date >= ?1 AND (?2 IS NULL OR date <= ?2)",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&mut *self.conn)
        .await?;

        debug!("Temperature summary {}..{:?}: {:?}", start, end, summary);
        Ok(summary)
    }

    /// Hand the connection back to the pool
    pub fn close(self) {
        debug!("Session closed");
    }
}
