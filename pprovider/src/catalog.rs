//! Known model context limits used for token budgeting.
//!
//! ```rust
//! use pprovider::ModelCatalog;
//!
//! let catalog = ModelCatalog::openai_defaults();
//! assert_eq!(catalog.profile("gpt-4").context_window, 8192);
//! assert_eq!(catalog.profile("something-new").context_window, 4096);
//! ```

use pcommon::Registry;

pub const GPT4: &str = "gpt-4";
pub const GPT4_0613: &str = "gpt-4-0613";
pub const GPT4_1106_PREVIEW: &str = "gpt-4-1106-preview";
pub const GPT35_TURBO_0613: &str = "gpt-3.5-turbo-0613";
pub const GPT35_TURBO_16K: &str = "gpt-3.5-turbo-16k";

const FALLBACK_CONTEXT_WINDOW: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    pub id: String,
    pub context_window: u32,
    /// Hard cap on completion tokens, for models whose output limit is far
    /// below their context window.
    pub max_output_tokens: Option<u32>,
}

impl ModelProfile {
    pub fn new(id: impl Into<String>, context_window: u32) -> Self {
        Self {
            id: id.into(),
            context_window,
            max_output_tokens: None,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    profiles: Registry<String, ModelProfile>,
    fallback_context_window: u32,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            profiles: Registry::new(),
            fallback_context_window: FALLBACK_CONTEXT_WINDOW,
        }
    }
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn openai_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(ModelProfile::new(GPT4, 8192));
        catalog.register(ModelProfile::new(GPT4_0613, 8192));
        catalog.register(ModelProfile::new(GPT35_TURBO_0613, 4096));
        catalog.register(ModelProfile::new(GPT35_TURBO_16K, 16384));
        catalog.register(
            ModelProfile::new(GPT4_1106_PREVIEW, 128_000).with_max_output_tokens(4096),
        );
        catalog
    }

    pub fn with_fallback_context_window(mut self, context_window: u32) -> Self {
        self.fallback_context_window = context_window;
        self
    }

    pub fn register(&mut self, profile: ModelProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn contains(&self, model: &str) -> bool {
        self.profiles.contains_key(model)
    }

    pub fn models(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// Unknown models get the fallback window rather than an error so a new
    /// model id never blocks a conversation.
    pub fn profile(&self, model: &str) -> ModelProfile {
        self.profiles
            .get(model)
            .cloned()
            .unwrap_or_else(|| ModelProfile::new(model, self.fallback_context_window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_model_caps_output_below_context() {
        let catalog = ModelCatalog::openai_defaults();
        let profile = catalog.profile(GPT4_1106_PREVIEW);

        assert_eq!(profile.context_window, 128_000);
        assert_eq!(profile.max_output_tokens, Some(4096));
        assert_eq!(catalog.profile(GPT35_TURBO_16K).context_window, 16384);
    }

    #[test]
    fn unknown_models_use_configured_fallback() {
        let catalog = ModelCatalog::openai_defaults().with_fallback_context_window(2048);
        assert!(!catalog.contains("mystery"));
        assert_eq!(catalog.profile("mystery").context_window, 2048);
        assert_eq!(catalog.models().len(), 5);
    }
}
