//! Invocation context and result types.

use pcommon::{MetadataMap, SessionId, TraceId};
use pprovider::{FunctionCall, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: None,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionResult {
    pub function_name: String,
    pub output: String,
}

impl ToolExecutionResult {
    pub fn new(function_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            output: output.into(),
        }
    }

    pub fn from_call(call: &FunctionCall, output: impl Into<String>) -> Self {
        Self::new(call.name.clone(), output)
    }

    /// The `function`-role history entry carrying this result.
    pub fn into_message(self) -> Message {
        Message::function_result(self.function_name, self.output)
    }
}
