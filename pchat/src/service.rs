//! Streaming turn orchestration.
//!
//! One turn walks `BudgetCheck -> Streaming -> (FunctionDispatch ->
//! BudgetCheck)* -> Completing`. The budget is recomputed before every backend
//! call because function round trips grow the history mid-turn. Text deltas
//! are yielded as soon as they arrive; cancellation, the turn deadline and a
//! dropped event stream all end in the same commit of the partial buffer.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;
use pprovider::{
    ChatBackend, ChatRequest, FunctionCall, FunctionDefinition, Message, ModelCatalog,
    NoopOperationHooks, ProviderError, ProviderOperationHooks,
};
use ptooling::{ToolError, ToolExecutionContext, ToolRuntime};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    ChatError, ChatPolicy, FunctionStatus, NoopTurnHooks, SessionStore, SharedTokenizer,
    TurnEvent, TurnEventStream, TurnHooks, TurnOutcome, TurnPhase, TurnRequest, TurnSummary,
    default_tokenizer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    TimedOut,
}

impl Interrupt {
    fn outcome(self) -> TurnOutcome {
        match self {
            Self::Cancelled => TurnOutcome::Cancelled,
            Self::TimedOut => TurnOutcome::TimedOut,
        }
    }
}

/// Races `future` against the turn's cancellation token and deadline.
async fn interruptible<F>(
    cancel: &CancellationToken,
    deadline: Instant,
    future: F,
) -> Result<F::Output, Interrupt>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(Interrupt::TimedOut),
        output = future => Ok(output),
    }
}

enum AttemptEnd {
    Finished,
    Failed { error: ProviderError, produced: bool },
}

#[derive(Debug, Default)]
struct TurnStats {
    backend_calls: u32,
    rate_limit_retries: u32,
    function_calls: u32,
    round_limit_reached: bool,
}

#[derive(Clone)]
pub struct ChatService {
    backend: Arc<dyn ChatBackend>,
    store: Arc<SessionStore>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    tokenizer: SharedTokenizer,
    catalog: Arc<ModelCatalog>,
    policy: ChatPolicy,
    hooks: Arc<dyn TurnHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

const STREAM_OPERATION: &str = "stream_chat";

pub struct ChatServiceBuilder {
    backend: Arc<dyn ChatBackend>,
    store: Option<Arc<SessionStore>>,
    tool_runtime: Option<Arc<dyn ToolRuntime>>,
    tokenizer: Option<SharedTokenizer>,
    catalog: Option<Arc<ModelCatalog>>,
    policy: ChatPolicy,
    hooks: Arc<dyn TurnHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

impl ChatServiceBuilder {
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn tool_runtime(mut self, runtime: Arc<dyn ToolRuntime>) -> Self {
        self.tool_runtime = Some(runtime);
        self
    }

    pub fn tokenizer(mut self, tokenizer: SharedTokenizer) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_function_round_trips(mut self, limit: u32) -> Self {
        self.policy.max_function_round_trips = Some(limit);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn TurnHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Hooks for backend attempts, retries and their final result.
    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            backend: self.backend,
            store: self.store.unwrap_or_default(),
            tool_runtime: self.tool_runtime,
            tokenizer: self.tokenizer.unwrap_or_else(default_tokenizer),
            catalog: self
                .catalog
                .unwrap_or_else(|| Arc::new(ModelCatalog::openai_defaults())),
            policy: self.policy,
            hooks: self.hooks,
            provider_hooks: self.provider_hooks,
        }
    }
}

impl ChatService {
    pub fn builder(backend: Arc<dyn ChatBackend>) -> ChatServiceBuilder {
        ChatServiceBuilder {
            backend,
            store: None,
            tool_runtime: None,
            tokenizer: None,
            catalog: None,
            policy: ChatPolicy::default(),
            hooks: Arc::new(NoopTurnHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    fn function_definitions(&self) -> Vec<FunctionDefinition> {
        match (&self.tool_runtime, self.policy.functions_enabled) {
            (Some(runtime), true) => runtime.definitions(),
            _ => Vec::new(),
        }
    }

    /// Starts a turn and returns its event stream.
    ///
    /// Only request problems are errors: empty input, or a turn already in
    /// flight for the session. Everything that happens once the turn runs is
    /// reported through the stream and ends in exactly one
    /// [`TurnEvent::TurnComplete`].
    pub fn stream_turn<'a>(
        &'a self,
        request: TurnRequest,
    ) -> Result<TurnEventStream<'a>, ChatError> {
        if request.input.trim().is_empty() {
            return Err(ChatError::invalid_request("input must not be empty"));
        }

        let TurnRequest {
            session_id,
            input,
            trace_id,
        } = request;

        let guard = self.store.begin_turn(&session_id)?;
        guard.append_history(Message::user(input));

        let model = guard.snapshot().model;
        let profile = self.catalog.profile(&model);
        let functions = self.function_definitions();
        let cancel = guard.handle().token();
        let deadline = Instant::now() + self.policy.turn_timeout;

        let mut context = ToolExecutionContext::new(session_id.clone());
        if let Some(trace_id) = trace_id {
            context = context.with_trace_id(trace_id);
        }

        self.hooks.on_turn_start(&session_id, &model);

        let events = stream! {
            let mut guard = guard;
            let mut stats = TurnStats::default();
            let mut dispatched = HashSet::<FunctionCall>::new();

            let outcome = 'turn: loop {
                self.hooks.on_phase(&session_id, TurnPhase::BudgetCheck);
                let messages = guard.snapshot().prompt_messages();
                let check = self.policy.budget.check(
                    self.tokenizer.as_ref(),
                    &profile,
                    &messages,
                    &functions,
                );
                self.hooks.on_budget_checked(&session_id, &check);

                let Some(max_tokens) = check.max_tokens else {
                    yield TurnEvent::Notice(ChatError::budget_exhausted(check.used).user_notice());
                    break 'turn TurnOutcome::BudgetExhausted { used: check.used };
                };

                let backend_request = ChatRequest::new(model.clone(), messages)
                    .with_max_tokens(max_tokens)
                    .with_functions(functions.clone())
                    .with_options(self.policy.options);

                self.hooks.on_phase(&session_id, TurnPhase::Streaming);
                let mut function_name = String::new();
                let mut function_args = String::new();
                let mut attempt = 0_u32;

                loop {
                    attempt += 1;
                    stats.backend_calls += 1;
                    self.hooks.on_backend_call(&session_id, attempt);
                    self.provider_hooks
                        .on_attempt_start(self.backend.id(), STREAM_OPERATION, attempt);

                    let opened = interruptible(
                        &cancel,
                        deadline,
                        self.backend.stream_chat(backend_request.clone()),
                    )
                    .await;

                    let end = match opened {
                        Err(interrupt) => break 'turn interrupt.outcome(),
                        Ok(Err(error)) => AttemptEnd::Failed { error, produced: false },
                        Ok(Ok(mut deltas)) => {
                            let mut produced = false;
                            loop {
                                let next =
                                    match interruptible(&cancel, deadline, deltas.next()).await {
                                        Err(interrupt) => break 'turn interrupt.outcome(),
                                        Ok(next) => next,
                                    };

                                let chunk = match next {
                                    None => break AttemptEnd::Finished,
                                    Some(Err(error)) => {
                                        break AttemptEnd::Failed { error, produced };
                                    }
                                    Some(Ok(chunk)) => chunk,
                                };

                                function_name.push_str(&chunk.function_name);
                                function_args.push_str(&chunk.function_arguments);
                                let terminal = chunk.is_terminal();

                                if !chunk.content.is_empty() {
                                    produced = true;
                                    guard.append_buffer(&chunk.content);
                                    yield TurnEvent::TextDelta(chunk.content);
                                }

                                if terminal {
                                    break AttemptEnd::Finished;
                                }
                            }
                        }
                    };

                    let (error, produced) = match end {
                        AttemptEnd::Finished => {
                            self.provider_hooks
                                .on_success(self.backend.id(), STREAM_OPERATION, attempt);
                            break;
                        }
                        AttemptEnd::Failed { error, produced } => (error, produced),
                    };

                    if !produced && self.policy.retry.should_retry(attempt, &error) {
                        stats.rate_limit_retries += 1;
                        let delay = self.policy.retry.delay_for_attempt(attempt);
                        self.hooks.on_rate_limited(&session_id, attempt, delay, &error);
                        self.provider_hooks.on_retry_scheduled(
                            self.backend.id(),
                            STREAM_OPERATION,
                            attempt,
                            delay,
                            &error,
                        );
                        function_name.clear();
                        function_args.clear();

                        if let Err(interrupt) =
                            interruptible(&cancel, deadline, tokio::time::sleep(delay)).await
                        {
                            break 'turn interrupt.outcome();
                        }
                        continue;
                    }

                    self.hooks.on_backend_error(&session_id, &error);
                    self.provider_hooks
                        .on_failure(self.backend.id(), STREAM_OPERATION, attempt, &error);
                    let error = ChatError::from(error);
                    yield TurnEvent::Notice(error.user_notice());
                    break 'turn TurnOutcome::Failed(error);
                }

                if function_name.is_empty() {
                    break 'turn TurnOutcome::Completed;
                }

                self.hooks.on_phase(&session_id, TurnPhase::FunctionDispatch);
                if let Some(limit) = self.policy.max_function_round_trips {
                    if stats.function_calls >= limit {
                        stats.round_limit_reached = true;
                        self.hooks.on_round_limit(&session_id, limit);
                        yield TurnEvent::Notice(format!(
                            "Stopped after {limit} function calls in a single reply."
                        ));
                        break 'turn TurnOutcome::Completed;
                    }
                }

                stats.function_calls += 1;
                let call = FunctionCall::new(function_name, function_args);
                self.hooks.on_function_dispatch(&session_id, &call);
                guard.append_history(Message::function_call(call.clone()));
                yield TurnEvent::FunctionCall(call.clone());

                if !dispatched.insert(call.clone()) {
                    self.hooks.on_duplicate_call(&session_id, &call);
                    let rejection = ChatError::duplicate_call(&call.name).message;
                    guard.append_history(Message::function_result(
                        call.name.clone(),
                        rejection.clone(),
                    ));
                    yield TurnEvent::FunctionResult {
                        name: call.name,
                        output: rejection,
                        status: FunctionStatus::Rejected,
                    };
                    continue 'turn;
                }

                let executed = match &self.tool_runtime {
                    Some(runtime) => {
                        let execution = runtime.execute(call.clone(), context.clone());
                        interruptible(&cancel, deadline, execution).await
                    }
                    None => Ok(Err(ToolError::not_found("no functions are available")
                        .with_tool_name(call.name.clone()))),
                };

                let (output, status) = match executed {
                    Err(interrupt) => break 'turn interrupt.outcome(),
                    Ok(Ok(result)) => (result.output, FunctionStatus::Succeeded),
                    Ok(Err(error)) => {
                        self.hooks.on_function_failed(&session_id, &call, &error);
                        (
                            ChatError::function_failed(error.to_string()).message,
                            FunctionStatus::Failed,
                        )
                    }
                };

                guard.append_history(Message::function_result(call.name.clone(), output.clone()));
                yield TurnEvent::FunctionResult {
                    name: call.name,
                    output,
                    status,
                };
            };

            self.hooks.on_phase(&session_id, TurnPhase::Completing);
            if outcome == TurnOutcome::TimedOut {
                yield TurnEvent::Notice("The reply took too long and was stopped.".to_string());
            }

            let summary = TurnSummary {
                session_id: session_id.clone(),
                outcome,
                committed: guard.commit(),
                backend_calls: stats.backend_calls,
                rate_limit_retries: stats.rate_limit_retries,
                function_calls: stats.function_calls,
                function_round_limit_reached: stats.round_limit_reached,
            };
            self.hooks.on_turn_complete(&summary);
            yield TurnEvent::TurnComplete(summary);
        };

        Ok(Box::pin(events))
    }
}
