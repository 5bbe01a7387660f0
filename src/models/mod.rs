//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod audit;
pub mod duration;
pub mod entry;
pub mod prize;

pub use audit::*;
pub use duration::*;
pub use entry::*;
pub use prize::*;
