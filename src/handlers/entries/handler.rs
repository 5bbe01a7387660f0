//! Entry handler implementations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::Bib,
    race::{RankedEntry, TimingOutcome},
    services::RaceService,
    state::AppState,
};

use super::{
    request::{EditEntryRequest, EntryRequest, RecordTimeQuery},
    response::EntriesListResponse,
};

/// Current ranking
pub async fn list_entries(State(state): State<AppState>) -> Json<EntriesListResponse> {
    let entries = RaceService::list_entries(state.race()).await;
    Json(EntriesListResponse {
        total: entries.len(),
        entries,
    })
}

/// Register a new entry
pub async fn add_entry(
    State(state): State<AppState>,
    Json(payload): Json<EntryRequest>,
) -> AppResult<(StatusCode, Json<RankedEntry>)> {
    payload.validate()?;

    let ranked = RaceService::add_entry(state.race(), payload.into_entry_data()?).await?;
    Ok((StatusCode::CREATED, Json(ranked)))
}

/// Replace the entry at a place
pub async fn edit_entry(
    State(state): State<AppState>,
    Path(place): Path<usize>,
    Json(payload): Json<EditEntryRequest>,
) -> AppResult<Json<RankedEntry>> {
    payload.validate()?;

    let EditEntryRequest { fingerprint, entry } = payload;
    let ranked = RaceService::edit_entry(state.race(), &fingerprint, place, entry.into_entry_data()?).await?;
    Ok(Json(ranked))
}

/// Link or confirm a finish time
pub async fn record_time(
    State(state): State<AppState>,
    Path(bib): Path<Bib>,
    Query(query): Query<RecordTimeQuery>,
) -> AppResult<Json<TimingOutcome>> {
    let outcome = RaceService::record_time(state.race(), bib, query.scanned).await?;
    Ok(Json(outcome))
}

/// Take back an unconfirmed finish time
pub async fn remove_time(
    State(state): State<AppState>,
    Path(bib): Path<Bib>,
) -> AppResult<Json<TimingOutcome>> {
    let outcome = RaceService::remove_time(state.race(), bib).await?;
    Ok(Json(outcome))
}
