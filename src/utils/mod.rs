//! Utility functions

pub mod crypto;
pub mod time;
pub mod validation;

pub use crypto::hash_string;
pub use time::{format_timestamp, parse_datetime, Clock, ManualClock, SystemClock};
pub use validation::{validate_email, validate_name};
