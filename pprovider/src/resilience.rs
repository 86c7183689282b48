//! Rate-limit retry policy and operational hook contracts.

use std::time::Duration;

use crate::{ProviderError, ProviderId};

/// Fixed-delay retry for rate-limited backend calls.
///
/// Only rate-limit errors are retried. The delay never grows and the attempt
/// count is unbounded unless `max_attempts` is set; the caller's cancellation
/// is the backstop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        if !error.is_rate_limited() {
            return false;
        }

        match self.max_attempts {
            Some(max_attempts) => attempt < max_attempts,
            None => true,
        }
    }

    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limits_are_retried_and_without_limit_by_default() {
        let policy = RetryPolicy::default();
        let limited = ProviderError::rate_limited("429");
        let unavailable = ProviderError::unavailable("503");

        assert!(policy.should_retry(1, &limited));
        assert!(policy.should_retry(10_000, &limited));
        assert!(!policy.should_retry(1, &unavailable));
    }

    #[test]
    fn delay_is_fixed_across_attempts() {
        let policy = RetryPolicy::fixed(Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(7), Duration::from_secs(10));
    }

    #[test]
    fn optional_attempt_cap_stops_retries() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        let limited = ProviderError::rate_limited("429");

        assert!(policy.should_retry(2, &limited));
        assert!(!policy.should_retry(3, &limited));
    }
}
