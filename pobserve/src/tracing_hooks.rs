//! Tracing-based hooks for backend attempts, function calls, turns and delivery.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pchat::TurnHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{BudgetCheck, TurnHooks, TurnOutcome, TurnPhase, TurnSummary};
use pcommon::SessionId;
use pdeliver::{DeliveryHooks, SinkError};
use pprovider::{FunctionCall, ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::debug!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "function",
            event = "execution_start",
            function = call.name,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "function",
            event = "execution_success",
            function = call.name,
            session_id = %context.session_id,
            output_len = result.output.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "function",
            event = "execution_failure",
            function = call.name,
            session_id = %context.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl TurnHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session: &SessionId, model: &str) {
        tracing::info!(phase = "turn", event = "start", session_id = %session, model);
    }

    fn on_phase(&self, session: &SessionId, phase: TurnPhase) {
        tracing::trace!(
            phase = "turn",
            event = "phase",
            session_id = %session,
            turn_phase = phase.as_str()
        );
    }

    fn on_budget_checked(&self, session: &SessionId, check: &BudgetCheck) {
        tracing::debug!(
            phase = "turn",
            event = "budget_checked",
            session_id = %session,
            used = check.used,
            remaining = check.remaining,
            max_tokens = check.max_tokens
        );
    }

    fn on_rate_limited(
        &self,
        session: &SessionId,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "turn",
            event = "rate_limited",
            session_id = %session,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error
        );
    }

    fn on_backend_error(&self, session: &SessionId, error: &ProviderError) {
        tracing::error!(
            phase = "turn",
            event = "backend_error",
            session_id = %session,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_function_dispatch(&self, session: &SessionId, call: &FunctionCall) {
        tracing::info!(
            phase = "turn",
            event = "function_dispatch",
            session_id = %session,
            function = call.name,
            arguments = call.arguments
        );
    }

    fn on_duplicate_call(&self, session: &SessionId, call: &FunctionCall) {
        tracing::warn!(
            phase = "turn",
            event = "duplicate_call",
            session_id = %session,
            function = call.name
        );
    }

    fn on_function_failed(&self, session: &SessionId, call: &FunctionCall, error: &ToolError) {
        tracing::warn!(
            phase = "turn",
            event = "function_failed",
            session_id = %session,
            function = call.name,
            error = %error
        );
    }

    fn on_round_limit(&self, session: &SessionId, limit: u32) {
        tracing::warn!(phase = "turn", event = "round_limit", session_id = %session, limit);
    }

    fn on_turn_complete(&self, summary: &TurnSummary) {
        match &summary.outcome {
            TurnOutcome::Failed(error) => tracing::error!(
                phase = "turn",
                event = "complete",
                session_id = %summary.session_id,
                outcome = summary.outcome.label(),
                backend_calls = summary.backend_calls,
                error = %error
            ),
            _ => tracing::info!(
                phase = "turn",
                event = "complete",
                session_id = %summary.session_id,
                outcome = summary.outcome.label(),
                committed_len = summary.committed.as_ref().map_or(0, String::len),
                backend_calls = summary.backend_calls,
                rate_limit_retries = summary.rate_limit_retries,
                function_calls = summary.function_calls
            ),
        }
    }
}

impl DeliveryHooks for TracingObservabilityHooks {
    fn on_window_created(&self, session_id: &SessionId, index: usize) {
        tracing::debug!(
            phase = "delivery",
            event = "window_created",
            session_id = %session_id,
            index
        );
    }

    fn on_window_edited(&self, session_id: &SessionId, index: usize) {
        tracing::trace!(
            phase = "delivery",
            event = "window_edited",
            session_id = %session_id,
            index
        );
    }

    fn on_formatting_rejected(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        tracing::warn!(
            phase = "delivery",
            event = "formatting_rejected",
            session_id = %session_id,
            index,
            error = %error
        );
    }

    fn on_delivery_failed(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        tracing::error!(
            phase = "delivery",
            event = "delivery_failed",
            session_id = %session_id,
            index,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
