//! Bounded-time wrapper around any language model.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::LlmError;
use crate::llm::{LanguageModel, LlmRequest, LlmResponse};

/// A model that wraps another model and fails with [`LlmError::Timeout`]
/// when the inner call does not finish in time.
pub struct TimeoutModel<M: LanguageModel> {
    inner: M,
    timeout: Duration,
}

impl<M: LanguageModel> TimeoutModel<M> {
    /// Wrap `inner` with the given timeout.
    pub fn new(inner: M, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wrap `inner` with a timeout in seconds.
    pub fn with_secs(inner: M, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for TimeoutModel<M> {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.invoke(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} call exceeded {:?}", self.inner.name(), self.timeout);
                Err(LlmError::Timeout(self.timeout))
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatMessage;

    struct SlowModel {
        delay: Duration,
    }

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn invoke(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok(LlmResponse::from_message(ChatMessage::assistant("done")))
        }

        fn name(&self) -> &str {
            "SlowModel"
        }
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let model = TimeoutModel::new(
            SlowModel {
                delay: Duration::from_millis(1),
            },
            Duration::from_secs(5),
        );
        let response = model.invoke(LlmRequest::default()).await.unwrap();
        assert_eq!(response.first_message().unwrap().text().as_deref(), Some("done"));
        assert_eq!(model.name(), "SlowModel");
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let model = TimeoutModel::new(
            SlowModel {
                delay: Duration::from_secs(5),
            },
            Duration::from_millis(20),
        );
        let result = model.invoke(LlmRequest::default()).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }
}
