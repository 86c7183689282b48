//! OpenAI HTTP payload serde models for the function-calling chat API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderError;

use super::types::{OpenAiFunction, OpenAiMessage, OpenAiRequest, OpenAiStreamChunk};

pub(crate) fn build_api_request(request: OpenAiRequest) -> Result<OpenAiApiRequest, ProviderError> {
    if request.messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "OpenAI request requires at least one message",
        ));
    }

    let messages = request
        .messages
        .into_iter()
        .map(OpenAiApiMessage::from)
        .collect::<Vec<_>>();

    let functions = if request.functions.is_empty() {
        None
    } else {
        Some(
            request
                .functions
                .into_iter()
                .map(OpenAiApiFunction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(OpenAiApiRequest {
        model: request.model,
        messages,
        functions,
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: request.max_tokens,
        stream: request.stream,
    })
}

/// Error body details: the human message plus the machine code, when present.
pub(crate) fn extract_error(body: &str) -> Option<(String, Option<String>)> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    let code = parsed.error.code.or(parsed.error.r#type);
    Some((parsed.error.message, code))
}

pub(crate) fn parse_stream_payload(payload: &str) -> Result<OpenAiStreamChunk, ProviderError> {
    let parsed: OpenAiApiStreamResponse = serde_json::from_str(payload)
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    let Some(choice) = parsed.choices.into_iter().next() else {
        return Ok(OpenAiStreamChunk::default());
    };

    let (function_name, function_arguments) = match choice.delta.function_call {
        Some(call) => (call.name, call.arguments),
        None => (None, None),
    };

    Ok(OpenAiStreamChunk {
        content: choice.delta.content,
        function_name,
        function_arguments,
        finish_reason: choice.finish_reason.filter(|reason| !reason.is_empty()),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiErrorEnvelope {
    pub error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<OpenAiApiFunction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<OpenAiApiFunctionCall>,
}

impl From<OpenAiMessage> for OpenAiApiMessage {
    fn from(value: OpenAiMessage) -> Self {
        Self {
            role: value.role,
            content: value.content,
            name: value.name,
            function_call: value.function_call.map(|call| OpenAiApiFunctionCall {
                name: call.name,
                arguments: call.arguments,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl TryFrom<OpenAiFunction> for OpenAiApiFunction {
    type Error = ProviderError;

    fn try_from(value: OpenAiFunction) -> Result<Self, Self::Error> {
        let parameters = serde_json::from_str::<Value>(&value.parameters).map_err(|_| {
            ProviderError::invalid_request("OpenAI function parameters must be valid JSON")
        })?;

        Ok(Self {
            name: value.name,
            description: value.description,
            parameters,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamResponse {
    #[serde(default)]
    pub choices: Vec<OpenAiApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamChoice {
    #[serde(default)]
    pub delta: OpenAiApiStreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenAiApiStreamDelta {
    pub content: Option<String>,
    pub function_call: Option<OpenAiApiDeltaFunctionCall>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaFunctionCall {
    pub name: Option<String>,
    pub arguments: Option<String>,
}
