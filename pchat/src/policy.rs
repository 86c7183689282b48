//! Turn-level limits and sampling settings.

use std::time::Duration;

use pcommon::GenerationOptions;
use pprovider::RetryPolicy;

use crate::TokenBudget;

pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_MAX_FUNCTION_ROUND_TRIPS: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPolicy {
    pub turn_timeout: Duration,
    pub retry: RetryPolicy,
    pub budget: TokenBudget,
    /// `None` leaves the function loop bounded only by the token budget and
    /// the duplicate-call check.
    pub max_function_round_trips: Option<u32>,
    pub functions_enabled: bool,
    pub options: GenerationOptions,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            retry: RetryPolicy::default(),
            budget: TokenBudget::default(),
            max_function_round_trips: Some(DEFAULT_MAX_FUNCTION_ROUND_TRIPS),
            functions_enabled: true,
            options: GenerationOptions::default()
                .with_temperature(0.7)
                .with_top_p(1.0),
        }
    }
}

impl ChatPolicy {
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_max_function_round_trips(mut self, limit: Option<u32>) -> Self {
        self.max_function_round_trips = limit;
        self
    }

    pub fn with_functions_enabled(mut self, enabled: bool) -> Self {
        self.functions_enabled = enabled;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}
