//! Context-window budget accounting.
//!
//! ```rust
//! use pchat::{HeuristicTokenizer, TokenBudget};
//! use pprovider::{Message, ModelProfile};
//!
//! let budget = TokenBudget::default();
//! let profile = ModelProfile::new("gpt-4", 8192);
//! let check = budget.check(
//!     &HeuristicTokenizer::default(),
//!     &profile,
//!     &[Message::user("2+2?")],
//!     &[],
//! );
//!
//! assert!(!check.is_exhausted());
//! assert!(check.remaining < 8192 - 100);
//! ```

use pprovider::{FunctionDefinition, Message, ModelProfile};

use crate::Tokenizer;

pub const DEFAULT_RESERVED_MARGIN: usize = 100;
pub const DEFAULT_MIN_BUDGET: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub reserved_margin: usize,
    pub min_budget: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            reserved_margin: DEFAULT_RESERVED_MARGIN,
            min_budget: DEFAULT_MIN_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCheck {
    /// Prompt tokens: history, role labels and function schema.
    pub used: usize,
    /// May be negative when the history alone overflows the window.
    pub remaining: i64,
    /// Completion limit to send, absent when the budget is exhausted.
    pub max_tokens: Option<u32>,
}

impl BudgetCheck {
    pub fn is_exhausted(&self) -> bool {
        self.max_tokens.is_none()
    }
}

impl TokenBudget {
    pub fn with_reserved_margin(mut self, reserved_margin: usize) -> Self {
        self.reserved_margin = reserved_margin;
        self
    }

    pub fn with_min_budget(mut self, min_budget: usize) -> Self {
        self.min_budget = min_budget;
        self
    }

    pub fn message_tokens(tokenizer: &dyn Tokenizer, message: &Message) -> usize {
        let mut tokens = tokenizer.count(&message.content) + tokenizer.count(message.role.as_str());

        if let Some(name) = &message.name {
            tokens += tokenizer.count(name);
        }

        if let Some(call) = &message.function_call {
            tokens += tokenizer.count(&call.name) + tokenizer.count(&call.arguments);
        }

        tokens
    }

    pub fn history_tokens(tokenizer: &dyn Tokenizer, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|message| Self::message_tokens(tokenizer, message))
            .sum()
    }

    pub fn schema_tokens(tokenizer: &dyn Tokenizer, functions: &[FunctionDefinition]) -> usize {
        functions
            .iter()
            .map(|function| {
                let serialized = function
                    .to_schema()
                    .ok()
                    .and_then(|schema| serde_json::to_string(&schema).ok())
                    .unwrap_or_else(|| {
                        format!(
                            "{}{}{}",
                            function.name, function.description, function.parameters
                        )
                    });
                tokenizer.count(&serialized)
            })
            .sum()
    }

    pub fn check(
        &self,
        tokenizer: &dyn Tokenizer,
        profile: &ModelProfile,
        messages: &[Message],
        functions: &[FunctionDefinition],
    ) -> BudgetCheck {
        let used =
            Self::history_tokens(tokenizer, messages) + Self::schema_tokens(tokenizer, functions);
        let remaining =
            i64::from(profile.context_window) - used as i64 - self.reserved_margin as i64;

        let max_tokens = if remaining < self.min_budget as i64 {
            None
        } else {
            let cap = profile
                .max_output_tokens
                .map_or(remaining, |cap| remaining.min(i64::from(cap)));
            Some(u32::try_from(cap).unwrap_or(u32::MAX))
        };

        BudgetCheck {
            used,
            remaining,
            max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use pprovider::FunctionCall;

    use super::*;
    use crate::HeuristicTokenizer;

    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn remaining_strictly_decreases_as_history_grows() {
        let budget = TokenBudget::default();
        let profile = ModelProfile::new("gpt-4", 8192);
        let mut history = vec![Message::system("You are helpful")];
        let mut previous = budget.check(&WordTokenizer, &profile, &history, &[]).remaining;

        for text in ["one", "two words", "", "three more words"] {
            history.push(Message::user(text));
            let next = budget.check(&WordTokenizer, &profile, &history, &[]).remaining;
            assert!(next < previous, "{next} should be below {previous}");
            previous = next;
        }
    }

    #[test]
    fn role_labels_and_function_calls_are_charged() {
        let call = Message::function_call(FunctionCall::new("lookup", "{\"q\": \"x\"}"));
        // role "assistant" + name "lookup" + two argument words
        assert_eq!(TokenBudget::message_tokens(&WordTokenizer, &call), 4);

        let result = Message::function_result("lookup", "the result");
        assert_eq!(TokenBudget::message_tokens(&WordTokenizer, &result), 4);
    }

    #[test]
    fn exhaustion_below_threshold_yields_no_max_tokens() {
        let budget = TokenBudget::default();
        let profile = ModelProfile::new("tiny", 115);
        let history = vec![Message::user("a b c d")];

        // 4 words + "user" = 5; 115 - 5 - 100 = 10, exactly the threshold.
        let check = budget.check(&WordTokenizer, &profile, &history, &[]);
        assert_eq!(check.remaining, 10);
        assert_eq!(check.max_tokens, Some(10));

        let history = vec![Message::user("a b c d e")];
        let check = budget.check(&WordTokenizer, &profile, &history, &[]);
        assert_eq!(check.remaining, 9);
        assert!(check.is_exhausted());
    }

    #[test]
    fn output_cap_limits_max_tokens() {
        let budget = TokenBudget::default();
        let profile = ModelProfile::new("gpt-4-1106-preview", 128_000).with_max_output_tokens(4096);
        let check = budget.check(&WordTokenizer, &profile, &[Message::user("hi")], &[]);
        assert_eq!(check.max_tokens, Some(4096));
        assert!(check.remaining > 4096);
    }

    #[test]
    fn function_schema_counts_toward_usage() {
        let budget = TokenBudget::default();
        let profile = ModelProfile::new("gpt-4", 8192);
        let history = vec![Message::user("hi")];
        let functions = vec![FunctionDefinition::new(
            "http_get",
            "Fetch a web page and return its text",
            r#"{"type":"object","properties":{"url":{"type":"string"}},"required":["url"]}"#,
        )];

        let tokenizer = HeuristicTokenizer::default();
        let without = budget.check(&tokenizer, &profile, &history, &[]);
        let with = budget.check(&tokenizer, &profile, &history, &functions);
        assert!(with.used > without.used);
        assert_eq!(
            with.used - without.used,
            TokenBudget::schema_tokens(&tokenizer, &functions)
        );
    }
}
