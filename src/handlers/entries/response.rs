//! Entry response DTOs

use serde::Serialize;

use crate::race::RankedEntry;

/// Entry list response
#[derive(Debug, Serialize)]
pub struct EntriesListResponse {
    pub entries: Vec<RankedEntry>,
    pub total: usize,
}
