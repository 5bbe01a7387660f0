//! Prize configuration handlers

mod handler;
pub mod response;

pub use handler::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Prize routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(handler::get_prizes).put(handler::set_prizes))
}
