//! Precipitation Routes

use axum::{extract::State, Json};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::one_year_before;
use tracing::debug;

use crate::{ApiError, AppState};

/// Date → precipitation for the trailing year of data
pub type PrecipitationResponse = BTreeMap<String, Option<f64>>;

/// Get precipitation for the twelve months ending at the latest measurement.
///
/// Rows sharing a date collapse to one key; the last row read wins.
pub async fn get_precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PrecipitationResponse>, ApiError> {
    let mut session = state.store.session().await?;

    let Some(latest) = session.latest_date().await? else {
        return Ok(Json(PrecipitationResponse::new()));
    };
    let start = one_year_before(&latest)?;
    let rows = session.precipitation_since(&start).await?;
    session.close();

    let mut by_date = PrecipitationResponse::new();
    for row in rows {
        by_date.insert(row.date, row.precipitation);
    }

    debug!("Precipitation {}..={}: {} dates", start, latest, by_date.len());
    Ok(Json(by_date))
}
