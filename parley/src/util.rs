//! Small convenience constructors for common types.

use pprovider::catalog::{GPT4_1106_PREVIEW, GPT35_TURBO_16K};

use crate::{Message, ProviderId, SessionId, TurnRequest};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::assistant(content)
}

pub fn function_message(name: impl Into<String>, content: impl Into<String>) -> Message {
    Message::function_result(name, content)
}

pub fn turn(session_id: impl Into<SessionId>, input: impl Into<String>) -> TurnRequest {
    TurnRequest::new(session_id, input)
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "openai" => Some(ProviderId::OpenAi),
        "openai-compatible" | "openai_compatible" | "compatible" | "local" => {
            Some(ProviderId::OpenAiCompatible)
        }
        _ => None,
    }
}

/// Resolves the short model names used by the `gpt4`/`gpt35` commands.
pub fn parse_model_alias(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gpt4" | "gpt-4" => Some(GPT4_1106_PREVIEW),
        "gpt35" | "gpt3.5" | "gpt-3.5" => Some(GPT35_TURBO_16K),
        _ => None,
    }
}
