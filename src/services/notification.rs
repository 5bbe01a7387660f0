//! Result notifications
//!
//! The race queues a [`ResultNotice`] on an unbounded channel when an entry is
//! confirmed. A [`NotificationDispatcher`] drains the channel off the request
//! path and hands each message to a [`Notifier`], retrying failed deliveries
//! with capped, jittered exponential backoff until they go through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::NotifyConfig;
use crate::constants::NOTIFY_JITTER_PCT;
use crate::models::RaceDuration;

/// A confirmed result waiting to be announced
#[derive(Debug, Clone, PartialEq)]
pub struct ResultNotice {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub duration: RaceDuration,
}

/// Sending half handed to the race
#[derive(Debug, Clone)]
pub struct NotificationSink {
    pub(crate) sender: mpsc::UnboundedSender<ResultNotice>,
    /// Optional-field column that holds the address
    pub(crate) email_field: String,
}

impl NotificationSink {
    pub fn new(sender: mpsc::UnboundedSender<ResultNotice>, email_field: &str) -> Self {
        Self {
            sender,
            email_field: email_field.to_string(),
        }
    }
}

/// A composed message
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMessage {
    pub fn compose(notice: &ResultNotice, race_name: &str, from: &str) -> Self {
        Self {
            to: notice.email.clone(),
            from: from.to_string(),
            subject: format!("{} Results", race_name),
            body: format!(
                "Congratulations {} {}!  You finished the {} in {}!",
                notice.first_name, notice.last_name, race_name, notice.duration
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivery backend
///
/// A mail transport goes behind this trait; returning `Err` from `deliver`
/// puts the message back on the backoff schedule.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: &OutgoingMessage) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them
///
/// The default backend when no mail transport is configured. It never fails,
/// so the retry path only runs with a real [`Notifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }
}

/// Retry delays for failed deliveries
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_pct: f64,
}

impl BackoffPolicy {
    pub fn new(initial_delay_ms: u64, max_delay_ms: u64, jitter_pct: f64) -> Self {
        let initial_delay_ms = initial_delay_ms.max(1);
        Self {
            initial_delay_ms,
            max_delay_ms: max_delay_ms.max(initial_delay_ms),
            jitter_pct: jitter_pct.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(
            config.initial_backoff_ms,
            config.max_backoff_ms,
            NOTIFY_JITTER_PCT,
        )
    }

    /// Delay before retry number `attempt` (0-based): doubles each time, capped
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        if self.jitter_pct == 0.0 {
            return Duration::from_millis(delay);
        }
        let spread = (delay as f64 * self.jitter_pct) as i64;
        let delta = rand::rng().random_range(-spread..=spread);
        Duration::from_millis(delay.saturating_add_signed(delta))
    }
}

/// Keep trying until the notifier accepts the message
pub async fn deliver_until_sent(notifier: &dyn Notifier, message: &OutgoingMessage, policy: &BackoffPolicy) {
    let mut attempt = 0;
    loop {
        match notifier.deliver(message).await {
            Ok(()) => {
                tracing::info!(to = %message.to, attempts = attempt + 1, "Result notification sent");
                return;
            }
            Err(e) => {
                let delay = policy.next_delay(attempt);
                tracing::warn!(
                    to = %message.to,
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying result notification after delay"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

/// Background consumer of the notification channel
///
/// Delivers through any [`Notifier`]; `main` wires in [`LogNotifier`].
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    policy: BackoffPolicy,
    race_name: String,
    from: String,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, policy: BackoffPolicy, race_name: &str, from: &str) -> Self {
        Self {
            notifier,
            policy,
            race_name: race_name.to_string(),
            from: from.to_string(),
        }
    }

    /// Consume notices until every sender is gone, then wait for deliveries
    /// still in flight.
    pub fn spawn(self, mut receiver: mpsc::UnboundedReceiver<ResultNotice>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let policy = Arc::new(self.policy);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    notice = receiver.recv() => {
                        let Some(notice) = notice else { break };
                        let message = OutgoingMessage::compose(&notice, &self.race_name, &self.from);
                        let notifier = self.notifier.clone();
                        let policy = policy.clone();
                        in_flight.spawn(async move {
                            deliver_until_sent(notifier.as_ref(), &message, &policy).await;
                        });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }

            tracing::info!(pending = in_flight.len(), "Notification channel closed");
            while in_flight.join_next().await.is_some() {}
        })
    }
}
