use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::completion::{self, CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{Instrument, debug_span, info_span};

use super::RateLimitResponse;

/// Completion model that waits on a shared limiter before every request.
///
/// Clones share the limiter, so handing a clone to each pipeline worker keeps
/// the combined request rate within one quota.
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self::with_shared_limiter(model, Arc::new(limiter))
    }

    /// Wrap `model` with a limiter that is already shared elsewhere
    pub fn with_shared_limiter(model: M, limiter: Arc<DefaultDirectRateLimiter>) -> Self {
        Self { model, limiter }
    }

    pub fn limiter(&self) -> Arc<DefaultDirectRateLimiter> {
        Arc::clone(&self.limiter)
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        self.limiter.until_ready().instrument(debug_span!("limiter")).await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("completion"))
            .await;
        response.map(|response| CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}
