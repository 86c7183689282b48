//! Token counting for budget accounting.
//!
//! [`BpeTokenizer`] uses the `cl100k_base` encoding shared by the GPT-3.5 and
//! GPT-4 families. [`HeuristicTokenizer`] is the fallback when the encoding
//! cannot be loaded.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

pub type SharedTokenizer = Arc<dyn Tokenizer>;

pub struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    pub fn cl100k() -> Option<Self> {
        tiktoken_rs::cl100k_base().ok().map(|bpe| Self { bpe })
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BpeTokenizer(cl100k_base)")
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        self.bpe.encode_ordinary(text).len()
    }
}

/// Roughly four characters per token, rounded up.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicTokenizer {
    chars_per_token: usize,
}

impl Default for HeuristicTokenizer {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

impl HeuristicTokenizer {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

pub fn default_tokenizer() -> SharedTokenizer {
    match BpeTokenizer::cl100k() {
        Some(tokenizer) => Arc::new(tokenizer),
        None => Arc::new(HeuristicTokenizer::default()),
    }
}
