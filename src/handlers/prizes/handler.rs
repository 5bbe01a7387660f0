//! Prize handler implementations

use axum::{extract::State, Json};

use crate::{error::AppResult, models::parse_prize_list, services::RaceService, state::AppState};

use super::response::PrizesResponse;

/// Prize table with current winners
pub async fn get_prizes(State(state): State<AppState>) -> Json<PrizesResponse> {
    Json(PrizesResponse {
        prizes: RaceService::prizes(state.race()).await,
    })
}

/// Replace the prize table.
///
/// The body is a JSON array of prizes or a stream of prize objects, in the
/// same format as the prize file.
pub async fn set_prizes(State(state): State<AppState>, body: String) -> AppResult<Json<PrizesResponse>> {
    let prizes = parse_prize_list(&body)?;
    let prizes = RaceService::set_prizes(state.race(), prizes).await?;
    Ok(Json(PrizesResponse { prizes }))
}
