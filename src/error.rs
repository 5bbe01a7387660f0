//! Custom error types and handling
//!
//! `RaceError` is what the race aggregate rejects a request with. `AppError`
//! wraps it for the HTTP layer and implements conversion to Axum responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Bib, FormatError};

/// Broad class of a rejected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, rejected before any mutation
    Validation,
    /// Valid input that clashes with current state; retry with fresh data
    Conflict,
    /// Unknown bib or place
    NotFound,
}

/// Race aggregate errors. State is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RaceError {
    #[error("Race has not started yet, cannot link a bib")]
    NotStarted,

    #[error("Bib #{0} not found")]
    BibNotFound(Bib),

    #[error("Bib #{0} already confirmed")]
    AlreadyConfirmed(Bib),

    #[error("Cannot remove time for bib #{0}, time is already removed")]
    NothingToRemove(Bib),

    #[error("Entry already exists for bib #{0}")]
    DuplicateBib(Bib),

    #[error("Entry does not contain a bib and the race has started")]
    BibRequiredAfterStart,

    #[error("Entries already exist, the optional fields cannot change now")]
    SchemaLocked,

    #[error("Race already started at {current}, cannot start it at {requested}")]
    AlreadyStarted {
        current: DateTime<Utc>,
        requested: DateTime<Utc>,
    },

    #[error("Entry at place {place} changed since it was read, try your change again")]
    StaleEdit { place: usize },

    #[error("Bib #{bib} already assigned to {holder}")]
    BibConflict { bib: Bib, holder: String },

    #[error("Place {place} is out of range, {len} entries registered")]
    PlaceOutOfRange { place: usize, len: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Snapshot missing the following columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Duration error: {0}")]
    Format(#[from] FormatError),
}

impl RaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::MissingColumns(_) | Self::Format(_) => ErrorKind::Validation,
            Self::BibNotFound(_) | Self::PlaceOutOfRange { .. } => ErrorKind::NotFound,
            Self::NotStarted
            | Self::AlreadyConfirmed(_)
            | Self::NothingToRemove(_)
            | Self::DuplicateBib(_)
            | Self::BibRequiredAfterStart
            | Self::SchemaLocked
            | Self::AlreadyStarted { .. }
            | Self::StaleEdit { .. }
            | Self::BibConflict { .. } => ErrorKind::Conflict,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::BibNotFound(_) => "BIB_NOT_FOUND",
            Self::AlreadyConfirmed(_) => "ALREADY_CONFIRMED",
            Self::NothingToRemove(_) => "NOTHING_TO_REMOVE",
            Self::DuplicateBib(_) => "DUPLICATE_BIB",
            Self::BibRequiredAfterStart => "BIB_REQUIRED_AFTER_START",
            Self::SchemaLocked => "SCHEMA_LOCKED",
            Self::AlreadyStarted { .. } => "ALREADY_STARTED",
            Self::StaleEdit { .. } => "STALE_EDIT",
            Self::BibConflict { .. } => "BIB_CONFLICT",
            Self::PlaceOutOfRange { .. } => "PLACE_OUT_OF_RANGE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::Format(_) => "FORMAT_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Race(#[from] RaceError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Race(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Race(e) => e.status_code(),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Race(e) => {
                tracing::info!(code = e.error_code(), "Rejected race operation: {}", e);
                e.to_string()
            }
            _ => self.to_string(),
        };

        let kind = match &self {
            AppError::Race(e) => Some(e.kind()),
            AppError::Validation(_) => Some(ErrorKind::Validation),
            AppError::Internal(_) => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
                kind,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias for race operations
pub type RaceResult<T> = Result<T, RaceError>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
