//! Entry registration and finish-line timing handlers

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

/// Entry routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_entries).post(handler::add_entry))
        .route("/{place}", put(handler::edit_entry))
}

/// Bib timing routes
pub fn bib_routes() -> Router<AppState> {
    Router::new().route(
        "/{bib}/time",
        post(handler::record_time).delete(handler::remove_time),
    )
}
