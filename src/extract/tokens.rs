//! Token counting for section budgets.

use crate::error::Result;

/// Counts the model tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> Result<usize>;
}

/// Character-based estimate.
///
/// Every whitespace-separated word costs `ceil(chars / chars_per_token)` tokens,
/// so the count of two texts joined by whitespace is the sum of their counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxTokenCounter {
    chars_per_token: usize,
}

impl ApproxTokenCounter {
    /// Create a counter assuming `chars_per_token` characters per token (at least 1).
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for ApproxTokenCounter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenCounter for ApproxTokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        Ok(text
            .split_whitespace()
            .map(|word| word.chars().count().div_ceil(self.chars_per_token))
            .sum())
    }
}

/// Exact counts from a HuggingFace `tokenizer.json`.
#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenCounter {
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenCounter {
    /// Load a tokenizer definition from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let tokenizer = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| crate::error::Error::Tokenizer(e.to_string()))?;
        Ok(Self { tokenizer })
    }
}

#[cfg(feature = "hf-tokenizer")]
impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| crate::error::Error::Tokenizer(e.to_string()))?;
        Ok(encoding.len())
    }
}
