//! Function registry keyed by function name.

use std::future::Future;
use std::sync::Arc;

use pcommon::Registry;
use pprovider::FunctionDefinition;

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn register_fn<F, Fut>(&mut self, definition: FunctionDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: FunctionDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// Definitions in name order, as sent to the backend.
    pub fn describe(&self) -> Vec<FunctionDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub async fn invoke(
        &self,
        name: &str,
        args_json: &str,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolError> {
        let tool = self.get(name).ok_or_else(|| {
            ToolError::not_found(format!("function '{name}' is not registered"))
                .with_tool_name(name)
        })?;

        tool.invoke(args_json, context)
            .await
            .map_err(|error| match error.tool_name {
                Some(_) => error,
                None => error.with_tool_name(name),
            })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolErrorKind;

    fn definition(name: &str) -> FunctionDefinition {
        FunctionDefinition::new(name, format!("{name} function"), r#"{"type":"object"}"#)
    }

    #[test]
    fn describe_lists_definitions_in_name_order() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("zeta"), |_, _| Ok(String::new()));
        registry.register_sync_fn(definition("alpha"), |_, _| Ok(String::new()));

        let names = registry
            .describe()
            .into_iter()
            .map(|definition| definition.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert!(registry.contains("zeta"));
        assert!(registry.remove("zeta").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn invoke_tags_errors_with_function_name() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("broken"), |_, _| Err(ToolError::execution("boom")));
        let context = ToolExecutionContext::new("session-1");

        let error = registry
            .invoke("broken", "{}", &context)
            .await
            .expect_err("handler should fail");
        assert_eq!(error.kind, ToolErrorKind::Execution);
        assert_eq!(error.tool_name.as_deref(), Some("broken"));

        let missing = registry
            .invoke("missing", "{}", &context)
            .await
            .expect_err("unknown function");
        assert_eq!(missing.kind, ToolErrorKind::NotFound);
    }
}
