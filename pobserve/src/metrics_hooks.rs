//! Metrics-based hooks. Every series is prefixed `parley_`.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use pprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{BudgetCheck, TurnHooks, TurnSummary};
use pcommon::SessionId;
use pdeliver::{DeliveryHooks, SinkError};
use pprovider::{FunctionCall, ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "parley_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "parley_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_provider_retry_delay_seconds",
            "provider" => provider.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::histogram!(
            "parley_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(f64::from(attempts));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "parley_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
        metrics::counter!("parley_function_call_total", "function" => call.name.clone())
            .increment(1);
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::histogram!(
            "parley_function_duration_seconds",
            "function" => call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_function_failure_total",
            "function" => call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_function_duration_seconds",
            "function" => call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl TurnHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session: &SessionId, model: &str) {
        metrics::counter!("parley_turn_start_total", "model" => model.to_string()).increment(1);
    }

    fn on_budget_checked(&self, _session: &SessionId, check: &BudgetCheck) {
        metrics::histogram!("parley_prompt_tokens").record(check.used as f64);
        if check.is_exhausted() {
            metrics::counter!("parley_budget_exhausted_total").increment(1);
        }
    }

    fn on_rate_limited(
        &self,
        _session: &SessionId,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        metrics::counter!("parley_rate_limit_retry_total").increment(1);
    }

    fn on_duplicate_call(&self, _session: &SessionId, call: &FunctionCall) {
        metrics::counter!("parley_duplicate_call_total", "function" => call.name.clone())
            .increment(1);
    }

    fn on_round_limit(&self, _session: &SessionId, _limit: u32) {
        metrics::counter!("parley_function_round_limit_total").increment(1);
    }

    fn on_turn_complete(&self, summary: &TurnSummary) {
        metrics::counter!(
            "parley_turn_complete_total",
            "outcome" => summary.outcome.label()
        )
        .increment(1);
        metrics::histogram!("parley_turn_backend_calls").record(f64::from(summary.backend_calls));
    }
}

impl DeliveryHooks for MetricsObservabilityHooks {
    fn on_window_created(&self, _session_id: &SessionId, _index: usize) {
        metrics::counter!("parley_delivery_window_created_total").increment(1);
    }

    fn on_window_edited(&self, _session_id: &SessionId, _index: usize) {
        metrics::counter!("parley_delivery_edit_total").increment(1);
    }

    fn on_formatting_rejected(&self, _session_id: &SessionId, _index: usize, _error: &SinkError) {
        metrics::counter!("parley_delivery_fallback_total").increment(1);
    }

    fn on_delivery_failed(&self, _session_id: &SessionId, _index: usize, error: &SinkError) {
        metrics::counter!(
            "parley_delivery_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_flush_throttled(&self, _session_id: &SessionId) {
        metrics::counter!("parley_delivery_throttled_total").increment(1);
    }
}
