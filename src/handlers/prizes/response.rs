//! Prize response DTOs

use serde::Serialize;

use crate::race::PrizeStanding;

/// Prize standings response
#[derive(Debug, Serialize)]
pub struct PrizesResponse {
    pub prizes: Vec<PrizeStanding>,
}
