//! Business logic services

pub mod heartbeat;
pub mod notification;
pub mod race_service;

pub use heartbeat::spawn_heartbeat;
pub use notification::{LogNotifier, NotificationDispatcher, NotificationSink, Notifier};
pub use race_service::RaceService;
