//! Race response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::AuditRecord;
use crate::race::RankedEntry;

/// Start race response
#[derive(Debug, Serialize)]
pub struct StartRaceResponse {
    pub started_at: DateTime<Utc>,
}

/// Optional field schema response
#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub optional_fields: Vec<String>,
}

/// Audit log response
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub records: Vec<AuditRecord>,
    pub total: usize,
}

/// Recent results response
#[derive(Debug, Serialize)]
pub struct RecentResultsResponse {
    pub results: Vec<RankedEntry>,
}
