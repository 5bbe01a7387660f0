//! Snapshot handler implementations

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    race::{ImportSummary, Snapshot},
    services::RaceService,
    state::AppState,
};

/// Export the race as rows
pub async fn export_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(RaceService::export_snapshot(state.race()).await)
}

/// Load rows into the race, all or nothing
pub async fn import_snapshot(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> AppResult<Json<ImportSummary>> {
    let summary = RaceService::import_snapshot(state.race(), snapshot).await?;
    Ok(Json(summary))
}
