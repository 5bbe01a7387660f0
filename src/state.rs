//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::race::Race;

/// The race behind a single writer / many readers lock
pub type SharedRace = Arc<RwLock<Race>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// The race being tracked
    race: SharedRace,

    /// Application configuration
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(race: Race, config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                race: Arc::new(RwLock::new(race)),
                config,
            }),
        }
    }

    /// Get a reference to the shared race
    pub fn race(&self) -> &SharedRace {
        &self.inner.race
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
