//! Race request DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::constants::MAX_OPTIONAL_FIELDS;

/// Start race request
#[derive(Debug, Default, Deserialize)]
pub struct StartRaceRequest {
    /// Start instant; the server clock when absent
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Optional field schema request
#[derive(Debug, Deserialize, Validate)]
pub struct SetSchemaRequest {
    #[validate(length(max = MAX_OPTIONAL_FIELDS))]
    pub optional_fields: Vec<String>,
}

/// Recent results query
#[derive(Debug, Deserialize)]
pub struct RecentResultsQuery {
    /// Confirmed finishers to include
    pub limit: Option<usize>,
}
