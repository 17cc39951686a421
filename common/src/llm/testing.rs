use super::model::Generator;
use crate::agent::prompt::GenerationRequest;
use crate::error::{Result, TalkDbError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// returns the same text for every request
pub(crate) struct StaticGenerator {
    output: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_question: Mutex<Option<String>>,
}

impl StaticGenerator {
    pub(crate) fn new(output: &str) -> Self {
        Self {
            output: Some(output.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_question: Mutex::new(None),
        }
    }

    /// behaves like an unreachable provider
    pub(crate) fn unavailable() -> Self {
        Self {
            output: None,
            ..Self::new("")
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_question(&self) -> Option<String> {
        self.last_question.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for StaticGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_question.lock().unwrap() = Some(request.user_question.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.output
            .clone()
            .ok_or_else(|| TalkDbError::GenerationUnavailable("provider unreachable".to_string()))
    }
}
