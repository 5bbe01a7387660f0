//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Handler limit of zero means "CPU count minus one"
pub const DEFAULT_HANDLER_LIMIT: usize = 0;

// =============================================================================
// RACE DEFAULTS
// =============================================================================

/// Default race name shown in notifications
pub const DEFAULT_RACE_NAME: &str = "Set RACE_NAME environment variable to change race name";

/// Optional-field column holding a racer's e-mail address
pub const DEFAULT_EMAIL_FIELD: &str = "Email";

/// Sender address for result notifications
pub const DEFAULT_EMAIL_FROM: &str = "racetrack@nonexistenthost.com";

/// Prize configuration loaded at startup when present
pub const DEFAULT_PRIZES_PATH: &str = "prizes.json";

/// Display value for an unset bib, duration or finish time
pub const UNSET_DISPLAY: &str = "--";

/// Confirmed finishers shown in the recent results view
pub const RECENT_CONFIRMED_LIMIT: usize = 10;

// =============================================================================
// REQUEST LIMITS
// =============================================================================

/// Maximum length of a first or last name
pub const MAX_NAME_LENGTH: u64 = 200;

/// Maximum competitor age accepted by the API
pub const MAX_AGE: u32 = 150;

/// Maximum number of optional fields per race
pub const MAX_OPTIONAL_FIELDS: u64 = 64;

// =============================================================================
// NOTIFICATION RETRY
// =============================================================================

/// First retry delay for a failed result notification
pub const DEFAULT_NOTIFY_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Upper bound for the notification retry delay
pub const DEFAULT_NOTIFY_MAX_BACKOFF_MS: u64 = 600_000;

/// Fraction of each retry delay randomized in either direction
pub const NOTIFY_JITTER_PCT: f64 = 0.2;

// =============================================================================
// HEARTBEAT
// =============================================================================

/// Heartbeat period once the race has started
pub const HEARTBEAT_RUNNING_SECS: u64 = 1;

/// Heartbeat period while waiting for the start
pub const HEARTBEAT_WAITING_SECS: u64 = 10;

// =============================================================================
// SNAPSHOT COLUMNS
// =============================================================================

/// Fixed snapshot columns, in export order
pub mod columns {
    pub const FIRST_NAME: &str = "Fname";
    pub const LAST_NAME: &str = "Lname";
    pub const AGE: &str = "Age";
    pub const GENDER: &str = "Gender";
    pub const BIB: &str = "Bib";
    pub const OVERALL_PLACE: &str = "Overall Place";
    pub const DURATION: &str = "Duration";
    pub const TIME_FINISHED: &str = "Time Finished";
    pub const CONFIRMED: &str = "Confirmed";

    /// Header prefix of every export
    pub const ALL: &[&str] = &[
        FIRST_NAME,
        LAST_NAME,
        AGE,
        GENDER,
        BIB,
        OVERALL_PLACE,
        DURATION,
        TIME_FINISHED,
        CONFIRMED,
    ];

    /// Columns an import cannot do without
    pub const MANDATORY: &[&str] = &[FIRST_NAME, LAST_NAME, AGE, GENDER];
}

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";
