//! Owner notifications delivered to a webhook.

use std::time::Duration;

use assistant_core::{async_trait, Notification, NotifyError, OwnerNotifier};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    content: &'a str,
}

/// Posts each notification as JSON `{"title", "content"}`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl OwnerNotifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                title: &notification.title,
                content: &notification.content,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        debug!(title = %notification.title, "Owner notification delivered");
        Ok(())
    }
}
