use std::time::Duration;

/// Configuration for contact extraction and LLM title classification
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Target chunk size in characters
    pub max_chunk_chars: usize,

    /// Chunks never exceed this many characters
    pub hard_ceiling_chars: usize,

    /// Sampling temperature for extraction requests
    pub temperature: f64,

    /// Token limit for ordinary chunks
    pub max_tokens: u64,

    /// Token limit for chunks with many addresses
    pub large_chunk_max_tokens: u64,

    /// A chunk with more `@` signs than this counts as large
    pub large_chunk_at_signs: usize,

    /// Attempts per LLM request
    pub max_attempts: u32,

    /// Base of the exponential backoff between attempts, in milliseconds
    pub backoff_base_ms: u64,

    /// Delay between consecutive chunks of one page, in milliseconds
    pub chunk_delay_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 20_000,
            hard_ceiling_chars: 24_000,
            temperature: 0.1,
            max_tokens: 2000,
            large_chunk_max_tokens: 4000,
            large_chunk_at_signs: 20,
            max_attempts: 3,
            backoff_base_ms: 1000,
            chunk_delay_ms: 1000,
        }
    }
}

/// Builder for ExtractionConfig
#[derive(Debug, Default)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }

    pub fn max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.config.max_chunk_chars = max_chunk_chars;
        self
    }

    pub fn hard_ceiling_chars(mut self, hard_ceiling_chars: usize) -> Self {
        self.config.hard_ceiling_chars = hard_ceiling_chars;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn large_chunk_max_tokens(mut self, large_chunk_max_tokens: u64) -> Self {
        self.config.large_chunk_max_tokens = large_chunk_max_tokens;
        self
    }

    pub fn large_chunk_at_signs(mut self, large_chunk_at_signs: usize) -> Self {
        self.config.large_chunk_at_signs = large_chunk_at_signs;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self
    }

    pub fn backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.config.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn chunk_delay_ms(mut self, chunk_delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = chunk_delay_ms;
        self
    }

    pub fn build(self) -> ExtractionConfig {
        self.config
    }
}

impl ExtractionConfig {
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }

    /// Wait before retry number `attempt` (zero-based): `base * 2^attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1 << attempt.min(16)))
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    /// Token limit for a chunk, larger when it holds many addresses
    pub fn max_tokens_for(&self, chunk: &str) -> u64 {
        if chunk.matches('@').count() > self.large_chunk_at_signs {
            self.large_chunk_max_tokens
        } else {
            self.max_tokens
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_tokens_scale_with_addresses() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_tokens_for("a@b.org"), 2000);
        assert_eq!(config.max_tokens_for(&"x@y.org ".repeat(21)), 4000);
        assert_eq!(config.max_tokens_for(&"x@y.org ".repeat(20)), 2000);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = ExtractionConfig::builder().backoff_base_ms(100).build();
        assert_eq!(config.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(400));
    }
}
