//! # LLM Client Module
//!
//! Wraps a `rig` completion model with a shared rate limiter so that every
//! worker in the pipeline draws from the same request quota.
//!
//! ## Key Components
//!
//! - `Client`: holds the rate-limited completion model used by extraction and
//!   title classification
//! - `RateLimitedCompletionModel`: a wrapper that adds rate limiting to any completion model
//! - `complete_text`: one-shot helper returning the text of a completion
//!
//! The API key is read from `OPENAI_API_KEY`.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use rig::{
    completion::{AssistantContent, CompletionError, CompletionModel},
    message::Message,
    providers::openai,
};
use tracing::{debug, warn};

use crate::error::{Error, Result};

#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;

/// Default OpenAI model for extraction and classification
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Default request quota per minute shared by all workers
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 500;

#[derive(Debug, Clone)]
pub struct Client<C>
where
    C: CompletionModel,
{
    completion_model: C,
}

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

fn per_minute_limiter(requests_per_minute: u32) -> governor::DefaultDirectRateLimiter {
    let quota = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(quota))
}

fn env_key(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::Auth(format!("{name} environment variable must be set")))
}

/// Create a rate-limited OpenAI client from `OPENAI_API_KEY`
pub fn openai_from_env(
    model: &str,
    requests_per_minute: u32,
) -> Result<Client<RateLimitedCompletionModel<impl CompletionModel + Clone>>> {
    let openai_api_key = env_key("OPENAI_API_KEY")?;
    let openai_client = openai::Client::new(&openai_api_key);
    let completion_model = RateLimitedCompletionModel::new(
        openai_client.completion_model(model),
        per_minute_limiter(requests_per_minute),
    );
    Ok(Client { completion_model })
}

impl<C> Client<C>
where
    C: CompletionModel,
{
    /// Wrap an already configured completion model
    pub fn from_model(completion_model: C) -> Self {
        Self { completion_model }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }
}

/// Send one prompt and return the concatenated text of the response.
///
/// Non-text content (tool calls) is ignored.
pub async fn complete_text<M: CompletionModel>(
    model: &M,
    preamble: &str,
    prompt: &str,
    temperature: f64,
    max_tokens: u64,
) -> std::result::Result<String, CompletionError> {
    let response = model
        .completion_request(Message::user(prompt))
        .preamble(preamble.to_string())
        .temperature(temperature)
        .max_tokens(max_tokens)
        .send()
        .await?;

    let choice_len = response.choice.len();
    let text = response
        .choice
        .iter()
        .filter_map(|c| match c {
            AssistantContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<String>>()
        .join("\n");

    if text.is_empty() && choice_len > 0 {
        warn!("model returned a non-text response");
    } else if text.is_empty() {
        debug!("model returned an empty response");
    }

    Ok(text)
}
