use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outbound notification hook (e-mail, in-app bell, chat adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Payload handed to the notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub recipient: String,
    pub subject_id: String,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(
        template: impl Into<String>,
        recipient: impl Into<String>,
        subject_id: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            recipient: recipient.into(),
            subject_id: subject_id.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget delivery: a failed publish is logged, the persisted transition stands.
pub(crate) fn dispatch<N>(publisher: &N, notification: Notification)
where
    N: NotificationPublisher + ?Sized,
{
    let template = notification.template.clone();
    let subject = notification.subject_id.clone();
    if let Err(error) = publisher.publish(notification) {
        tracing::warn!(%template, %subject, %error, "notification dispatch failed");
    }
}
