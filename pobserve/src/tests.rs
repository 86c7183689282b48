use std::sync::{Arc, Mutex};
use std::time::Duration;

use pchat::{BudgetCheck, ChatError, TurnHooks, TurnOutcome, TurnPhase, TurnSummary};
use pcommon::SessionId;
use pdeliver::{DeliveryHooks, SinkError};
use pprovider::{FunctionCall, ProviderError, ProviderId, ProviderOperationHooks};
use ptooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

use crate::{
    CompositeHooks, MetricsObservabilityHooks, SafeDeliveryHooks, SafeProviderHooks,
    SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks,
};

fn session() -> SessionId {
    SessionId::from("chat-1")
}

fn sample_call() -> FunctionCall {
    FunctionCall::new("http_get", "{\"url\":\"https://example.com\"}")
}

fn sample_context() -> ToolExecutionContext {
    ToolExecutionContext::new("chat-1").with_trace_id("trace-1")
}

fn sample_summary(outcome: TurnOutcome) -> TurnSummary {
    TurnSummary {
        session_id: session(),
        outcome,
        committed: Some("4".to_string()),
        backend_calls: 2,
        rate_limit_retries: 1,
        function_calls: 0,
        function_round_limit_reached: false,
    }
}

fn exercise_provider(hooks: &dyn ProviderOperationHooks) {
    let error = ProviderError::rate_limited("429:tokens");
    hooks.on_attempt_start(ProviderId::OpenAi, "stream_chat", 1);
    hooks.on_retry_scheduled(
        ProviderId::OpenAi,
        "stream_chat",
        1,
        Duration::from_secs(10),
        &error,
    );
    hooks.on_success(ProviderId::OpenAi, "stream_chat", 2);
    hooks.on_failure(ProviderId::OpenAi, "stream_chat", 2, &error);
}

fn exercise_tool(hooks: &dyn ToolRuntimeHooks) {
    hooks.on_execution_start(&sample_call(), &sample_context());
    hooks.on_execution_success(
        &sample_call(),
        &sample_context(),
        &ToolExecutionResult::from_call(&sample_call(), "{\"output\":\"ok\"}"),
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        &sample_call(),
        &sample_context(),
        &ToolError::timeout("too slow"),
        Duration::from_millis(20),
    );
}

fn exercise_turn(hooks: &dyn TurnHooks) {
    let error = ProviderError::unavailable("503");
    hooks.on_turn_start(&session(), "gpt-4");
    hooks.on_phase(&session(), TurnPhase::BudgetCheck);
    hooks.on_budget_checked(
        &session(),
        &BudgetCheck {
            used: 12,
            remaining: -3,
            max_tokens: None,
        },
    );
    hooks.on_backend_call(&session(), 1);
    hooks.on_rate_limited(&session(), 1, Duration::from_secs(10), &error);
    hooks.on_backend_error(&session(), &error);
    hooks.on_function_dispatch(&session(), &sample_call());
    hooks.on_duplicate_call(&session(), &sample_call());
    hooks.on_function_failed(&session(), &sample_call(), &ToolError::execution("boom"));
    hooks.on_round_limit(&session(), 16);
    hooks.on_turn_complete(&sample_summary(TurnOutcome::Completed));
    hooks.on_turn_complete(&sample_summary(TurnOutcome::Failed(
        ChatError::backend_unavailable("503"),
    )));
}

fn exercise_delivery(hooks: &dyn DeliveryHooks) {
    let error = SinkError::formatting_rejected("can't parse entities");
    hooks.on_window_created(&session(), 0);
    hooks.on_window_edited(&session(), 0);
    hooks.on_formatting_rejected(&session(), 0, &error);
    hooks.on_delivery_failed(&session(), 0, &error);
    hooks.on_flush_throttled(&session());
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;
    exercise_provider(&hooks);
    exercise_tool(&hooks);
    exercise_turn(&hooks);
    exercise_delivery(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;
    exercise_provider(&hooks);
    exercise_tool(&hooks);
    exercise_turn(&hooks);
    exercise_delivery(&hooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }

    fn count(&self) -> usize {
        self.events.lock().expect("events lock").len()
    }
}

impl ProviderOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        self.push("attempt_start");
    }

    fn on_success(&self, _provider: ProviderId, _operation: &str, _attempts: u32) {
        self.push("success");
    }
}

impl TurnHooks for RecordingHooks {
    fn on_turn_start(&self, _session: &SessionId, _model: &str) {
        self.push("turn_start");
    }

    fn on_duplicate_call(&self, _session: &SessionId, _call: &FunctionCall) {
        self.push("duplicate_call");
    }

    fn on_turn_complete(&self, _summary: &TurnSummary) {
        self.push("turn_complete");
    }
}

impl DeliveryHooks for RecordingHooks {
    fn on_formatting_rejected(&self, _session_id: &SessionId, _index: usize, _error: &SinkError) {
        self.push("formatting_rejected");
    }
}

struct PanicHooks;

impl ProviderOperationHooks for PanicHooks {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        panic!("failure panic");
    }
}

impl ToolRuntimeHooks for PanicHooks {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl TurnHooks for PanicHooks {
    fn on_phase(&self, _session: &SessionId, _phase: TurnPhase) {
        panic!("phase panic");
    }

    fn on_turn_complete(&self, _summary: &TurnSummary) {
        panic!("complete panic");
    }
}

impl DeliveryHooks for PanicHooks {
    fn on_window_created(&self, _session_id: &SessionId, _index: usize) {
        panic!("created panic");
    }

    fn on_delivery_failed(&self, _session_id: &SessionId, _index: usize, _error: &SinkError) {
        panic!("failed panic");
    }
}

#[test]
fn safe_wrappers_swallow_panics() {
    exercise_provider(&SafeProviderHooks::new(PanicHooks));
    exercise_tool(&SafeToolHooks::new(PanicHooks));
    exercise_turn(&SafeTurnHooks::new(PanicHooks));
    exercise_delivery(&SafeDeliveryHooks::new(PanicHooks));
}

#[test]
fn safe_wrappers_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    exercise_provider(&SafeProviderHooks::new(inner.clone()));
    exercise_turn(&SafeTurnHooks::new(inner.clone()));
    exercise_delivery(&SafeDeliveryHooks::new(inner.clone()));

    assert_eq!(
        *inner.events.lock().expect("events lock"),
        vec![
            "attempt_start",
            "success",
            "turn_start",
            "duplicate_call",
            "turn_complete",
            "turn_complete",
            "formatting_rejected",
        ]
    );
}

#[test]
fn composite_hooks_call_both_sides_in_order() {
    let first = RecordingHooks::default();
    let second = RecordingHooks::default();
    let hooks = CompositeHooks::new(first.clone(), second.clone());

    exercise_turn(&hooks);
    exercise_delivery(&hooks);

    assert_eq!(first.count(), 5);
    assert_eq!(second.count(), 5);
}

#[test]
fn composite_survives_a_panicking_side_when_wrapped() {
    let recorder = RecordingHooks::default();
    let hooks = SafeTurnHooks::new(CompositeHooks::new(recorder.clone(), PanicHooks));

    hooks.on_turn_start(&session(), "gpt-4");
    hooks.on_turn_complete(&sample_summary(TurnOutcome::Cancelled));

    assert_eq!(recorder.count(), 2);
}
