//! Racetrack - Live Footrace Tracking
//!
//! This library keeps the authoritative state of a single footrace: the
//! registered entries, the start instant, finish-line timing, the live
//! ranking and the prize standings.
//!
//! # Features
//!
//! - Two-scan bib confirmation (link, then confirm) with undo before confirmation
//! - Live ranking and age/gender prize awards
//! - Optimistic concurrency for entry edits
//! - Tabular snapshot export and all-or-nothing import
//! - Result notifications with retry
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Locking around the race, background tasks
//! - **Race**: The race aggregate
//! - **Models**: Domain models

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod race;
pub mod services;
pub mod state;
pub mod utils;

use axum::{middleware::from_fn, Router};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult, RaceError, RaceResult};
pub use race::Race;
pub use state::AppState;

/// Build the application router with its middleware stack
pub fn create_router(state: AppState) -> Router {
    let handler_limit = state.config().server.effective_handler_limit();

    Router::new()
        .nest(constants::API_BASE_PATH, handlers::routes())
        .layer(GlobalConcurrencyLimitLayer::new(handler_limit))
        .layer(from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
