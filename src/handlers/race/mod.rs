//! Race lifecycle handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Race routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::get_status))
        .route("/start", post(handler::start_race))
        .route("/schema", put(handler::set_schema))
}

/// Read-only views over the race
pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/audit", get(handler::get_audit_log))
        .route("/results/recent", get(handler::get_recent_results))
}
