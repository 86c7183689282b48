//! Fan-out to two hook implementations, first then second.

use std::time::Duration;

use pchat::{BudgetCheck, TurnHooks, TurnPhase, TurnSummary};
use pcommon::SessionId;
use pdeliver::{DeliveryHooks, SinkError};
use pprovider::{FunctionCall, ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeHooks<A, B> {
    first: A,
    second: B,
}

impl<A, B> CompositeHooks<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A, B> ProviderOperationHooks for CompositeHooks<A, B>
where
    A: ProviderOperationHooks,
    B: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        self.first.on_attempt_start(provider, operation, attempt);
        self.second.on_attempt_start(provider, operation, attempt);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        self.first
            .on_retry_scheduled(provider, operation, attempt, delay, error);
        self.second
            .on_retry_scheduled(provider, operation, attempt, delay, error);
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        self.first.on_success(provider, operation, attempts);
        self.second.on_success(provider, operation, attempts);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        self.first.on_failure(provider, operation, attempts, error);
        self.second.on_failure(provider, operation, attempts, error);
    }
}

impl<A, B> ToolRuntimeHooks for CompositeHooks<A, B>
where
    A: ToolRuntimeHooks,
    B: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        self.first.on_execution_start(call, context);
        self.second.on_execution_start(call, context);
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        self.first
            .on_execution_success(call, context, result, elapsed);
        self.second
            .on_execution_success(call, context, result, elapsed);
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        self.first
            .on_execution_failure(call, context, error, elapsed);
        self.second
            .on_execution_failure(call, context, error, elapsed);
    }
}

impl<A, B> TurnHooks for CompositeHooks<A, B>
where
    A: TurnHooks,
    B: TurnHooks,
{
    fn on_turn_start(&self, session: &SessionId, model: &str) {
        self.first.on_turn_start(session, model);
        self.second.on_turn_start(session, model);
    }

    fn on_phase(&self, session: &SessionId, phase: TurnPhase) {
        self.first.on_phase(session, phase);
        self.second.on_phase(session, phase);
    }

    fn on_budget_checked(&self, session: &SessionId, check: &BudgetCheck) {
        self.first.on_budget_checked(session, check);
        self.second.on_budget_checked(session, check);
    }

    fn on_backend_call(&self, session: &SessionId, attempt: u32) {
        self.first.on_backend_call(session, attempt);
        self.second.on_backend_call(session, attempt);
    }

    fn on_rate_limited(
        &self,
        session: &SessionId,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        self.first.on_rate_limited(session, attempt, delay, error);
        self.second.on_rate_limited(session, attempt, delay, error);
    }

    fn on_backend_error(&self, session: &SessionId, error: &ProviderError) {
        self.first.on_backend_error(session, error);
        self.second.on_backend_error(session, error);
    }

    fn on_function_dispatch(&self, session: &SessionId, call: &FunctionCall) {
        self.first.on_function_dispatch(session, call);
        self.second.on_function_dispatch(session, call);
    }

    fn on_duplicate_call(&self, session: &SessionId, call: &FunctionCall) {
        self.first.on_duplicate_call(session, call);
        self.second.on_duplicate_call(session, call);
    }

    fn on_function_failed(&self, session: &SessionId, call: &FunctionCall, error: &ToolError) {
        self.first.on_function_failed(session, call, error);
        self.second.on_function_failed(session, call, error);
    }

    fn on_round_limit(&self, session: &SessionId, limit: u32) {
        self.first.on_round_limit(session, limit);
        self.second.on_round_limit(session, limit);
    }

    fn on_turn_complete(&self, summary: &TurnSummary) {
        self.first.on_turn_complete(summary);
        self.second.on_turn_complete(summary);
    }
}

impl<A, B> DeliveryHooks for CompositeHooks<A, B>
where
    A: DeliveryHooks,
    B: DeliveryHooks,
{
    fn on_window_created(&self, session_id: &SessionId, index: usize) {
        self.first.on_window_created(session_id, index);
        self.second.on_window_created(session_id, index);
    }

    fn on_window_edited(&self, session_id: &SessionId, index: usize) {
        self.first.on_window_edited(session_id, index);
        self.second.on_window_edited(session_id, index);
    }

    fn on_formatting_rejected(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        self.first.on_formatting_rejected(session_id, index, error);
        self.second.on_formatting_rejected(session_id, index, error);
    }

    fn on_delivery_failed(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        self.first.on_delivery_failed(session_id, index, error);
        self.second.on_delivery_failed(session_id, index, error);
    }

    fn on_flush_throttled(&self, session_id: &SessionId) {
        self.first.on_flush_throttled(session_id);
        self.second.on_flush_throttled(session_id);
    }
}
