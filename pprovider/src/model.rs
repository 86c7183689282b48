//! Provider-agnostic message, request, and delta types.
//!
//! ```rust
//! use pprovider::{ChatRequest, Message, ProviderErrorKind};
//!
//! let ok = ChatRequest::new("gpt-4", vec![Message::user("2+2?")]).with_max_tokens(128);
//! assert!(ok.validate().is_ok());
//!
//! let err = ChatRequest::new("", vec![Message::user("hi")])
//!     .validate()
//!     .expect_err("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::fmt::{Display, Formatter};

use pcommon::GenerationOptions;

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    OpenAi,
    OpenAiCompatible,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::OpenAi => "openai",
            Self::OpenAiCompatible => "openai-compatible",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    /// Wire label; also what the token budget charges for the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed function call as requested by the model.
///
/// `arguments` is the raw JSON string exactly as streamed; it is never
/// normalised so that repeated calls compare byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One conversation entry. Immutable once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// For `Role::Function`, the function that produced `content`.
    pub name: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            function_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that consists only of a function call.
    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            name: None,
            function_call: Some(call),
        }
    }

    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: content.into(),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the parameters object.
    pub parameters: String,
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: parameters.into(),
        }
    }

    /// The definition as the backend receives it.
    pub fn to_schema(&self) -> Result<serde_json::Value, ProviderError> {
        let parameters = serde_json::from_str::<serde_json::Value>(&self.parameters).map_err(
            |err| {
                ProviderError::invalid_request(format!(
                    "function '{}' has an invalid parameter schema: {err}",
                    self.name
                ))
            },
        )?;

        Ok(serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": parameters,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub functions: Vec<FunctionDefinition>,
    pub options: GenerationOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            functions: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if self.max_tokens == Some(0) {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProviderError::invalid_request(
                    "temperature must be in the inclusive range 0.0..=2.0",
                ));
            }
        }

        if let Some(top_p) = self.options.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ProviderError::invalid_request(
                    "top_p must be in the inclusive range 0.0..=1.0",
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    FunctionCall,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "function_call" | "tool_calls" => Self::FunctionCall,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One incremental unit of a streaming generation.
///
/// Content and function-call fragments are concatenated by the consumer. The
/// first chunk carrying a `finish_reason` is terminal for its stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeltaChunk {
    pub content: String,
    pub function_name: String,
    pub function_arguments: String,
    pub finish_reason: Option<FinishReason>,
}

impl DeltaChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            ..Self::default()
        }
    }

    pub fn function_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            function_name: name.into(),
            function_arguments: arguments.into(),
            ..Self::default()
        }
    }

    pub fn finished(reason: FinishReason) -> Self {
        Self {
            finish_reason: Some(reason),
            ..Self::default()
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    pub fn has_function_delta(&self) -> bool {
        !self.function_name.is_empty() || !self.function_arguments.is_empty()
    }

    /// A chunk ends the stream only when it carries a non-empty reason.
    pub fn is_terminal(&self) -> bool {
        match &self.finish_reason {
            None => false,
            Some(FinishReason::Other(reason)) => !reason.trim().is_empty(),
            Some(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_messages_carry_producer_name() {
        let message = Message::function_result("lookup", "result");
        assert_eq!(message.role, Role::Function);
        assert_eq!(message.name.as_deref(), Some("lookup"));

        let call = Message::function_call(FunctionCall::new("lookup", "{\"q\":\"x\"}"));
        assert_eq!(call.role, Role::Assistant);
        assert!(call.content.is_empty());
    }

    #[test]
    fn finish_reason_parses_legacy_and_tool_spellings() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("function_call"), FinishReason::FunctionCall);
        assert_eq!(FinishReason::parse("tool_calls"), FinishReason::FunctionCall);
        assert_eq!(
            FinishReason::parse("weird"),
            FinishReason::Other("weird".to_string())
        );
    }

    #[test]
    fn only_non_empty_finish_reasons_are_terminal() {
        assert!(!DeltaChunk::content("Hi").is_terminal());

        let mut blank = DeltaChunk::content("Hi");
        blank.finish_reason = Some(FinishReason::Other(String::new()));
        assert!(!blank.is_terminal());

        assert!(DeltaChunk::content("Hi").with_finish_reason(FinishReason::Stop).is_terminal());
    }

    #[test]
    fn function_schema_rejects_invalid_json() {
        let broken = FunctionDefinition::new("lookup", "Looks up", "{");
        assert!(broken.to_schema().is_err());

        let ok = FunctionDefinition::new("lookup", "Looks up", "{\"type\":\"object\"}");
        let schema = ok.to_schema().expect("schema should build");
        assert_eq!(schema["parameters"]["type"], "object");
    }

    #[test]
    fn validate_rejects_zero_budget_and_bad_sampling() {
        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")]).with_max_tokens(0);
        assert!(request.validate().is_err());

        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")])
            .with_options(GenerationOptions::default().with_top_p(1.5));
        assert!(request.validate().is_err());
    }
}
