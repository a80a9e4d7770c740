//! Best-effort owner notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::NotifyError;

/// A notification for the project owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub content: String,
}

impl Notification {
    /// Create a notification.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Channel for owner notifications.
///
/// Callers never wait on delivery for their own success: use
/// [`notify_detached`] from request paths.
#[async_trait]
pub trait OwnerNotifier: Send + Sync {
    /// Deliver a notification.
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Send a notification on a background task; failures are only logged.
pub fn notify_detached(notifier: Arc<dyn OwnerNotifier>, notification: Notification) {
    tokio::spawn(async move {
        let title = notification.title.clone();
        if let Err(e) = notifier.notify(notification).await {
            warn!("Owner notification '{}' failed: {}", title, e);
        }
    });
}

/// A notifier that discards all notifications.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl OwnerNotifier for NoOpNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A notifier that logs every notification.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl OwnerNotifier for LoggingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!("[owner notification] {}: {}", notification.title, notification.content);
        Ok(())
    }
}

/// A notifier that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl OwnerNotifier for CollectingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FailingNotifier;

    #[async_trait]
    impl OwnerNotifier for FailingNotifier {
        async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("channel down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_noop_and_logging() {
        NoOpNotifier.notify(Notification::new("t", "c")).await.unwrap();
        LoggingNotifier.notify(Notification::new("t", "c")).await.unwrap();
    }

    #[tokio::test]
    async fn test_detached_delivery() {
        let collector = Arc::new(CollectingNotifier::new());
        notify_detached(collector.clone(), Notification::new("Conflict", "two sources"));

        for _ in 0..50 {
            if !collector.sent().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(collector.sent().await, vec![Notification::new("Conflict", "two sources")]);
    }

    #[tokio::test]
    async fn test_detached_failure_does_not_panic() {
        notify_detached(Arc::new(FailingNotifier), Notification::new("t", "c"));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
