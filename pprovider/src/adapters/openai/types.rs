//! OpenAI adapter types and conversions from the shared chat model.

use std::fmt::Formatter;

use crate::{DeltaChunk, FinishReason, FunctionCall, FunctionDefinition, Message, SecretString};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub functions: Vec<OpenAiFunction>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
    pub name: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl From<Message> for OpenAiMessage {
    fn from(value: Message) -> Self {
        Self {
            role: value.role.as_str().to_string(),
            content: value.content,
            name: value.name,
            function_call: value.function_call,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiFunction {
    pub name: String,
    pub description: String,
    pub parameters: String,
}

impl From<FunctionDefinition> for OpenAiFunction {
    fn from(value: FunctionDefinition) -> Self {
        Self {
            name: value.name,
            description: value.description,
            parameters: value.parameters,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum OpenAiAuth {
    ApiKey(SecretString),
}

impl OpenAiAuth {
    pub(crate) fn bearer(&self) -> &str {
        match self {
            Self::ApiKey(key) => key.expose(),
        }
    }
}

impl std::fmt::Debug for OpenAiAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("OpenAiAuth::ApiKey([REDACTED])"),
        }
    }
}

/// One decoded server-sent event from a streaming completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenAiStreamChunk {
    pub content: Option<String>,
    pub function_name: Option<String>,
    pub function_arguments: Option<String>,
    pub finish_reason: Option<String>,
}

impl OpenAiStreamChunk {
    /// Only a non-empty finish reason ends the stream.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason
            .as_deref()
            .is_some_and(|reason| !reason.is_empty())
    }
}

impl From<OpenAiStreamChunk> for DeltaChunk {
    fn from(value: OpenAiStreamChunk) -> Self {
        Self {
            content: value.content.unwrap_or_default(),
            function_name: value.function_name.unwrap_or_default(),
            function_arguments: value.function_arguments.unwrap_or_default(),
            finish_reason: value
                .finish_reason
                .as_deref()
                .filter(|reason| !reason.is_empty())
                .map(FinishReason::parse),
        }
    }
}
