//! Audit trail model

use serde::{Deserialize, Serialize};

use crate::models::{Bib, RaceDuration};

/// One link, confirm or unlink action.
///
/// Kept for operator visibility only; nothing reads it back to enforce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Elapsed race time when the action happened
    pub duration: RaceDuration,
    pub bib: Bib,
    pub removal: bool,
}
