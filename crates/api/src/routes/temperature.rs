//! Temperature Routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use storage::{one_year_before, TemperatureRecord, TemperatureSummary};
use tracing::debug;

use crate::{ApiError, AppState};

/// Get the trailing year of observations from the most active station
pub async fn get_tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TemperatureRecord>>, ApiError> {
    let mut session = state.store.session().await?;

    let Some(busiest) = session.most_active_station().await? else {
        return Ok(Json(Vec::new()));
    };
    let Some(latest) = session.latest_date_for_station(&busiest.station).await? else {
        return Ok(Json(Vec::new()));
    };
    let start = one_year_before(&latest)?;
    let rows = session.temperatures_since(&busiest.station, &start).await?;
    session.close();

    debug!(
        "Station {} ({} observations): {} rows since {}",
        busiest.station,
        busiest.observations,
        rows.len(),
        start
    );
    Ok(Json(rows))
}

/// Min/avg/max temperature from `start` onwards
pub async fn get_summary_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureSummary>, ApiError> {
    let mut session = state.store.session().await?;
    let summary = session.temperature_summary(&start, None).await?;
    session.close();

    Ok(Json(summary))
}

/// Min/avg/max temperature between `start` and `end`, both inclusive
pub async fn get_summary_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureSummary>, ApiError> {
    let mut session = state.store.session().await?;
    let summary = session.temperature_summary(&start, Some(end.as_str())).await?;
    session.close();

    Ok(Json(summary))
}
