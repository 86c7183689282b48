//! Wrappers that keep a panicking hook from taking a turn down with it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pchat::{BudgetCheck, TurnHooks, TurnPhase, TurnSummary};
use pcommon::SessionId;
use pdeliver::{DeliveryHooks, SinkError};
use pprovider::{FunctionCall, ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

fn guarded(call: impl FnOnce()) {
    let _ = catch_unwind(AssertUnwindSafe(call));
}

pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        guarded(|| self.inner.on_attempt_start(provider, operation, attempt));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        guarded(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        });
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        guarded(|| self.inner.on_success(provider, operation, attempts));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        guarded(|| self.inner.on_failure(provider, operation, attempts, error));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        guarded(|| self.inner.on_execution_start(call, context));
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_execution_success(call, context, result, elapsed)
        });
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_execution_failure(call, context, error, elapsed)
        });
    }
}

pub struct SafeTurnHooks<H> {
    inner: H,
}

impl<H> SafeTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnHooks for SafeTurnHooks<H>
where
    H: TurnHooks,
{
    fn on_turn_start(&self, session: &SessionId, model: &str) {
        guarded(|| self.inner.on_turn_start(session, model));
    }

    fn on_phase(&self, session: &SessionId, phase: TurnPhase) {
        guarded(|| self.inner.on_phase(session, phase));
    }

    fn on_budget_checked(&self, session: &SessionId, check: &BudgetCheck) {
        guarded(|| self.inner.on_budget_checked(session, check));
    }

    fn on_backend_call(&self, session: &SessionId, attempt: u32) {
        guarded(|| self.inner.on_backend_call(session, attempt));
    }

    fn on_rate_limited(
        &self,
        session: &SessionId,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        guarded(|| self.inner.on_rate_limited(session, attempt, delay, error));
    }

    fn on_backend_error(&self, session: &SessionId, error: &ProviderError) {
        guarded(|| self.inner.on_backend_error(session, error));
    }

    fn on_function_dispatch(&self, session: &SessionId, call: &FunctionCall) {
        guarded(|| self.inner.on_function_dispatch(session, call));
    }

    fn on_duplicate_call(&self, session: &SessionId, call: &FunctionCall) {
        guarded(|| self.inner.on_duplicate_call(session, call));
    }

    fn on_function_failed(&self, session: &SessionId, call: &FunctionCall, error: &ToolError) {
        guarded(|| self.inner.on_function_failed(session, call, error));
    }

    fn on_round_limit(&self, session: &SessionId, limit: u32) {
        guarded(|| self.inner.on_round_limit(session, limit));
    }

    fn on_turn_complete(&self, summary: &TurnSummary) {
        guarded(|| self.inner.on_turn_complete(summary));
    }
}

pub struct SafeDeliveryHooks<H> {
    inner: H,
}

impl<H> SafeDeliveryHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> DeliveryHooks for SafeDeliveryHooks<H>
where
    H: DeliveryHooks,
{
    fn on_window_created(&self, session_id: &SessionId, index: usize) {
        guarded(|| self.inner.on_window_created(session_id, index));
    }

    fn on_window_edited(&self, session_id: &SessionId, index: usize) {
        guarded(|| self.inner.on_window_edited(session_id, index));
    }

    fn on_formatting_rejected(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        guarded(|| self.inner.on_formatting_rejected(session_id, index, error));
    }

    fn on_delivery_failed(&self, session_id: &SessionId, index: usize, error: &SinkError) {
        guarded(|| self.inner.on_delivery_failed(session_id, index, error));
    }

    fn on_flush_throttled(&self, session_id: &SessionId) {
        guarded(|| self.inner.on_flush_throttled(session_id));
    }
}
