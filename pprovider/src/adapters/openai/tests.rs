//! Focused unit tests for OpenAI adapter internals.

#![cfg(test)]

use std::sync::Arc;

use futures_util::stream;
use reqwest::StatusCode;

use crate::{
    ChatBackend, ChatRequest, FinishReason, FunctionCall, FunctionDefinition, Message,
    ProviderError, ProviderErrorKind, ProviderFuture, SecureCredentialManager,
};

use super::provider::OpenAiProvider;
use super::serde_api::{build_api_request, extract_error, parse_stream_payload};
use super::transport::{OpenAiChunkStream, OpenAiTransport, error_for_status};
use super::types::{OpenAiAuth, OpenAiRequest};

#[derive(Debug)]
struct NoopTransport;

impl OpenAiTransport for NoopTransport {
    fn stream<'a>(
        &'a self,
        _request: OpenAiRequest,
        _auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async {
            let output = stream::iter(vec![Err(ProviderError::other("not used"))]);
            Ok(Box::pin(output) as OpenAiChunkStream<'a>)
        })
    }
}

fn provider() -> OpenAiProvider {
    OpenAiProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    )
}

#[test]
fn build_openai_request_keeps_function_history_shape() {
    let request = ChatRequest::new(
        "gpt-4",
        vec![
            Message::user("weather?"),
            Message::function_call(FunctionCall::new("weather", "{\"city\":\"Oslo\"}")),
            Message::function_result("weather", "{\"output\":\"rain\"}"),
        ],
    )
    .with_functions(vec![FunctionDefinition::new(
        "weather",
        "Look up weather",
        "{\"type\":\"object\"}",
    )]);

    let built = provider().build_openai_request(request);
    assert!(built.stream);
    assert_eq!(built.messages[1].role, "assistant");
    assert_eq!(
        built.messages[1].function_call.as_ref().map(|call| call.name.as_str()),
        Some("weather")
    );
    assert_eq!(built.messages[2].role, "function");
    assert_eq!(built.messages[2].name.as_deref(), Some("weather"));

    let api = build_api_request(built).expect("request should serialize");
    let json = serde_json::to_value(&api).expect("json");
    assert_eq!(json["functions"][0]["parameters"]["type"], "object");
    assert!(json.get("tools").is_none());
}

#[test]
fn build_api_request_rejects_invalid_function_schema() {
    let request = ChatRequest::new("gpt-4", vec![Message::user("hi")])
        .with_functions(vec![FunctionDefinition::new("broken", "", "{not json")]);
    let built = provider().build_openai_request(request);

    let error = build_api_request(built).expect_err("schema should fail");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn stream_payloads_map_to_delta_fields() {
    let text =
        parse_stream_payload(r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#)
            .expect("text payload");
    assert_eq!(text.content.as_deref(), Some("Hel"));

    let call = parse_stream_payload(
        r#"{"choices":[{"delta":{"function_call":{"name":"lookup","arguments":"{\"q\""}}}]}"#,
    )
    .expect("function payload");
    assert_eq!(call.function_name.as_deref(), Some("lookup"));
    assert_eq!(call.function_arguments.as_deref(), Some("{\"q\""));

    let done = parse_stream_payload(r#"{"choices":[{"delta":{},"finish_reason":"function_call"}]}"#)
        .expect("finish payload");
    let chunk = crate::DeltaChunk::from(done);
    assert_eq!(chunk.finish_reason, Some(FinishReason::FunctionCall));
}

#[test]
fn empty_finish_reason_does_not_end_the_stream() {
    let partial =
        parse_stream_payload(r#"{"choices":[{"delta":{"content":"Hi"},"finish_reason":""}]}"#)
            .expect("partial payload");
    assert!(!partial.is_terminal());

    let chunk = crate::DeltaChunk::from(partial);
    assert_eq!(chunk.content, "Hi");
    assert_eq!(chunk.finish_reason, None);

    let stop = parse_stream_payload(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#)
        .expect("stop payload");
    assert!(stop.is_terminal());
    assert_eq!(
        crate::DeltaChunk::from(stop).finish_reason,
        Some(FinishReason::Stop)
    );
}

#[test]
fn quota_errors_are_not_rate_limits() {
    let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
    let (message, code) = extract_error(body).expect("error body");

    let quota = error_for_status(StatusCode::TOO_MANY_REQUESTS, message, code.as_deref());
    assert_eq!(quota.kind, ProviderErrorKind::QuotaExceeded);
    assert!(!quota.retryable);

    let limited = error_for_status(
        StatusCode::TOO_MANY_REQUESTS,
        "Rate limit reached for tokens".to_string(),
        Some("rate_limit_exceeded"),
    );
    assert!(limited.is_rate_limited());
}

#[tokio::test]
async fn missing_api_key_fails_before_transport() {
    let provider = provider();
    let result = provider
        .stream_chat(ChatRequest::new("gpt-4", vec![Message::user("hi")]))
        .await;

    match result {
        Err(error) => assert_eq!(error.kind, ProviderErrorKind::Authentication),
        Ok(_) => panic!("stream should not open without credentials"),
    }
}
