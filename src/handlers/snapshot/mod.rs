//! Snapshot export and import handlers

mod handler;

pub use handler::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Snapshot routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(handler::export_snapshot).post(handler::import_snapshot))
}
