//! User-facing notifications
//!
//! Fire-and-forget toasts. The session publishes them on a broadcast
//! channel and whoever renders the UI subscribes.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// How a notification should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Destructive,
}

/// A single toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub fn normal(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Normal)
    }
}

/// Broadcasts notifications to any number of subscribers
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    tx: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish a notification. Nobody listening is not an error.
    pub fn notify(&self, notification: impl Into<Notification>) {
        let notification = notification.into();
        tracing::debug!(
            "Notification ({:?}): {} - {}",
            notification.severity,
            notification.title,
            notification.description
        );
        let _ = self.tx.send(notification);
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_without_subscribers() {
        let center = NotificationCenter::new();
        center.notify(Notification::normal("Hello", "Nobody hears this"));
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let center = NotificationCenter::new();
        let mut rx = center.subscribe();

        center.notify(Notification::normal("First", "one"));
        center.notify(Notification::new("Second", "two", Severity::Destructive));

        assert_eq!(rx.try_recv().unwrap().title, "First");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.title, "Second");
        assert_eq!(second.severity, Severity::Destructive);
    }
}
