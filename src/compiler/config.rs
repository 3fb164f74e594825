use crate::compiler::score::ScoreWeights;

/// Configuration for compilation
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Confidence weights
    pub weights: ScoreWeights,

    /// Reject contacts whose email is a shared mailbox such as info@
    pub reject_generic_emails: bool,

    /// File name of the main CSV inside the output directory
    pub output_file_name: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            reject_generic_emails: true,
            output_file_name: "final_contacts.csv".to_string(),
        }
    }
}

/// Builder for CompilerConfig
#[derive(Debug, Default)]
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CompilerConfig::default(),
        }
    }

    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.config.weights = weights;
        self
    }

    pub fn reject_generic_emails(mut self, reject: bool) -> Self {
        self.config.reject_generic_emails = reject;
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn build(self) -> CompilerConfig {
        self.config
    }
}

impl CompilerConfig {
    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::new()
    }
}
