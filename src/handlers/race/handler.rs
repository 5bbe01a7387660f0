//! Race handler implementations

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::{
    constants::RECENT_CONFIRMED_LIMIT,
    error::AppResult,
    race::RaceStatus,
    services::RaceService,
    state::AppState,
};

use super::{
    request::{RecentResultsQuery, SetSchemaRequest, StartRaceRequest},
    response::{AuditLogResponse, RecentResultsResponse, SchemaResponse, StartRaceResponse},
};

/// Race status and clock
pub async fn get_status(State(state): State<AppState>) -> Json<RaceStatus> {
    Json(RaceService::status(state.race()).await)
}

/// Start the race
pub async fn start_race(
    State(state): State<AppState>,
    Json(payload): Json<StartRaceRequest>,
) -> AppResult<Json<StartRaceResponse>> {
    let started_at = RaceService::start(state.race(), payload.at).await?;
    Ok(Json(StartRaceResponse { started_at }))
}

/// Declare the optional field columns
pub async fn set_schema(
    State(state): State<AppState>,
    Json(payload): Json<SetSchemaRequest>,
) -> AppResult<Json<SchemaResponse>> {
    payload.validate()?;

    let names = payload
        .optional_fields
        .into_iter()
        .map(|name| name.trim().to_string())
        .collect();
    let optional_fields = RaceService::set_optional_fields(state.race(), names).await?;
    Ok(Json(SchemaResponse { optional_fields }))
}

/// Audit trail of link, confirm and unlink actions
pub async fn get_audit_log(State(state): State<AppState>) -> Json<AuditLogResponse> {
    let records = RaceService::audit_log(state.race()).await;
    Json(AuditLogResponse {
        total: records.len(),
        records,
    })
}

/// Unconfirmed finishers and the latest confirmed ones
pub async fn get_recent_results(
    State(state): State<AppState>,
    Query(query): Query<RecentResultsQuery>,
) -> Json<RecentResultsResponse> {
    let limit = query.limit.unwrap_or(RECENT_CONFIRMED_LIMIT);
    let results = RaceService::recent_finishers(state.race(), limit).await;
    Json(RecentResultsResponse { results })
}
