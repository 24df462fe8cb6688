//! Station Routes

use axum::{extract::State, Json};
use std::sync::Arc;
use storage::StationRecord;

use crate::{ApiError, AppState};

/// List every station
pub async fn get_stations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StationRecord>>, ApiError> {
    let mut session = state.store.session().await?;
    let stations = session.stations().await?;
    session.close();

    Ok(Json(stations))
}
