//! Outbound notifications.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ProviderResult;
use crate::provider::BoxFuture;

/// A plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Delivers messages to people.
pub trait Notifier: Send + Sync {
    fn send(&self, message: OutgoingMessage) -> BoxFuture<'_, ProviderResult<()>>;

    /// Whether a successful `send` means the recipient got the message.
    fn delivers(&self) -> bool {
        true
    }
}

/// Records every message in the structured log instead of delivering it.
///
/// Used when no mail transport is configured; the operator can follow
/// bookings and reminders from the daemon log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: OutgoingMessage) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async move {
            info!(
                to = %message.to,
                subject = %message.subject,
                body = %message.body,
                "notification"
            );
            Ok(())
        })
    }

    fn delivers(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_accepts_messages() {
        let notifier = LogNotifier;
        notifier
            .send(OutgoingMessage::new(
                "ada@example.com",
                "Meeting Reminder",
                "See you soon",
            ))
            .await
            .unwrap();
        assert!(!notifier.delivers());
    }
}
