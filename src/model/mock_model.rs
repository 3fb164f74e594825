//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. Responses can be queued one per call (including injected
//! provider errors) or fixed for every call, and the number of calls is
//! recorded so tests can assert when the model was or was not consulted.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// A mock completion model for testing purposes.
#[derive(Debug, Clone)]
pub struct MockCompletionModel {
    /// Response returned when the queue is empty
    response: Arc<Mutex<Option<OneOrMany<AssistantContent>>>>,

    /// Per-call responses, consumed front to back. `Err` becomes a provider error.
    queue: Arc<Mutex<VecDeque<Result<String, String>>>>,

    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a new mock model that will return a default empty success response.
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(None)),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Helper to set a text response returned for every call.
    pub async fn set_text_response(&self, text: &str) {
        let mut guard = self.response.lock().await;
        *guard = Some(OneOrMany::one(AssistantContent::text(text)));
    }

    /// Queue a text response for the next unanswered call.
    pub async fn push_text_response(&self, text: &str) {
        self.queue.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queue a provider error for the next unanswered call.
    pub async fn push_error(&self, message: &str) {
        self.queue.lock().await.push_back(Err(message.to_string()));
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(queued) = self.queue.lock().await.pop_front() {
            return match queued {
                Ok(text) => Ok(CompletionResponse {
                    choice: OneOrMany::one(AssistantContent::text(text)),
                    raw_response: String::new(),
                }),
                Err(message) => Err(CompletionError::ProviderError(message)),
            };
        }

        let response = {
            let guard = self.response.lock().await;
            guard.clone()
        };
        Ok(CompletionResponse {
            choice: response.unwrap_or_else(|| OneOrMany::one(AssistantContent::text(""))),
            raw_response: String::new(),
        })
    }
}
