//! Function runtime trait and default registry-backed executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::future::{Either, select};
use pprovider::{FunctionCall, FunctionDefinition};

use crate::{
    NoopToolRuntimeHooks, ToolError, ToolExecutionContext, ToolExecutionResult, ToolFuture,
    ToolRegistry, ToolRuntimeHooks,
};

pub trait ToolRuntime: Send + Sync {
    /// Schemas advertised to the backend for this runtime.
    fn definitions(&self) -> Vec<FunctionDefinition>;

    fn execute<'a>(
        &'a self,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

#[derive(Clone)]
pub struct DefaultToolRuntime {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
    timeout: Option<Duration>,
}

impl Default for DefaultToolRuntime {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl DefaultToolRuntime {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn invoke_with_timeout(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolError> {
        let invocation = self.registry.invoke(&call.name, &call.arguments, context);

        let Some(timeout) = self.timeout else {
            return invocation.await;
        };

        match select(Box::pin(invocation), Delay::new(timeout)).await {
            Either::Left((output, _)) => output,
            Either::Right(((), _)) => Err(ToolError::timeout(format!(
                "function '{}' did not finish within {}ms",
                call.name,
                timeout.as_millis()
            ))
            .with_tool_name(call.name.clone())),
        }
    }
}

impl ToolRuntime for DefaultToolRuntime {
    fn definitions(&self) -> Vec<FunctionDefinition> {
        self.registry.describe()
    }

    fn execute<'a>(
        &'a self,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(&call, &context);
            let started = Instant::now();

            match self.invoke_with_timeout(&call, &context).await {
                Ok(output) => {
                    let result = ToolExecutionResult::from_call(&call, output);
                    self.hooks
                        .on_execution_success(&call, &context, &result, started.elapsed());
                    Ok(result)
                }
                Err(error) => {
                    self.hooks
                        .on_execution_failure(&call, &context, &error, started.elapsed());
                    Err(error)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pprovider::Role;

    use super::*;
    use crate::{Tool, ToolErrorKind};

    #[derive(Debug)]
    struct EchoTool;

    impl Tool for EchoTool {
        fn definition(&self) -> FunctionDefinition {
            FunctionDefinition::new("echo", "Echoes arguments", r#"{"type":"object"}"#)
        }

        fn invoke<'a>(
            &'a self,
            args_json: &'a str,
            context: &'a ToolExecutionContext,
        ) -> ToolFuture<'a, Result<String, ToolError>> {
            Box::pin(async move {
                Ok(format!("session={} args={}", context.session_id, args_json))
            })
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ToolRuntimeHooks for RecordingHooks {
        fn on_execution_start(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
            self.events.lock().expect("events lock").push(format!("start:{}", call.name));
        }

        fn on_execution_success(
            &self,
            call: &FunctionCall,
            _context: &ToolExecutionContext,
            _result: &ToolExecutionResult,
            _elapsed: Duration,
        ) {
            self.events.lock().expect("events lock").push(format!("ok:{}", call.name));
        }

        fn on_execution_failure(
            &self,
            call: &FunctionCall,
            _context: &ToolExecutionContext,
            error: &ToolError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("err:{}:{:?}", call.name, error.kind));
        }
    }

    #[tokio::test]
    async fn runtime_executes_registered_function_and_reports_hooks() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        let hooks = Arc::new(RecordingHooks::default());
        let runtime = DefaultToolRuntime::new(Arc::new(registry)).with_hooks(hooks.clone());

        let result = runtime
            .execute(
                FunctionCall::new("echo", "{\"a\":1}"),
                ToolExecutionContext::new("session-1"),
            )
            .await
            .expect("execution should succeed");

        assert_eq!(result.output, "session=session-1 args={\"a\":1}");
        let message = result.into_message();
        assert_eq!(message.role, Role::Function);
        assert_eq!(message.name.as_deref(), Some("echo"));
        assert_eq!(
            *hooks.events.lock().expect("events lock"),
            vec!["start:echo".to_string(), "ok:echo".to_string()]
        );
        assert_eq!(runtime.definitions().len(), 1);
    }

    #[tokio::test]
    async fn runtime_returns_not_found_for_unknown_function() {
        let hooks = Arc::new(RecordingHooks::default());
        let runtime =
            DefaultToolRuntime::new(Arc::new(ToolRegistry::new())).with_hooks(hooks.clone());

        let error = runtime
            .execute(
                FunctionCall::new("missing", "{}"),
                ToolExecutionContext::new("session-2"),
            )
            .await
            .expect_err("execution should fail");

        assert_eq!(error.kind, ToolErrorKind::NotFound);
        assert_eq!(
            hooks.events.lock().expect("events lock").last().map(String::as_str),
            Some("err:missing:NotFound")
        );
    }

    #[tokio::test]
    async fn slow_functions_time_out() {
        let mut registry = ToolRegistry::new();
        registry.register_fn(
            FunctionDefinition::new("slow", "Never finishes in time", r#"{"type":"object"}"#),
            |_, _| async {
                Delay::new(Duration::from_secs(5)).await;
                Ok("late".to_string())
            },
        );
        let runtime = DefaultToolRuntime::new(Arc::new(registry))
            .with_timeout(Duration::from_millis(20));

        let error = runtime
            .execute(
                FunctionCall::new("slow", "{}"),
                ToolExecutionContext::new("session-3"),
            )
            .await
            .expect_err("slow function should time out");

        assert_eq!(error.kind, ToolErrorKind::Timeout);
        assert_eq!(error.tool_name.as_deref(), Some("slow"));
    }
}
