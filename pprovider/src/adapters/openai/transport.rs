//! OpenAI transport trait and reqwest-based SSE implementation.

use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};

use crate::{ProviderError, ProviderFuture};

use super::serde_api::{build_api_request, extract_error, parse_stream_payload};
use super::types::{OpenAiAuth, OpenAiRequest, OpenAiStreamChunk};

pub type OpenAiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<OpenAiStreamChunk, ProviderError>> + Send + 'a>>;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn stream<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (message, code) = extract_error(&body)
            .unwrap_or_else(|| (format!("OpenAI request failed with status {status}"), None));

        error_for_status(status, message, code.as_deref())
    }
}

pub(crate) fn error_for_status(
    status: StatusCode,
    message: String,
    code: Option<&str>,
) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS if code == Some("insufficient_quota") => {
            ProviderError::quota_exceeded(message)
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::timeout(message)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::BAD_GATEWAY
        | StatusCode::INTERNAL_SERVER_ERROR => ProviderError::unavailable(message),
        _ => ProviderError::transport(message),
    }
}

fn send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn stream<'a>(
        &'a self,
        mut request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let api_request = build_api_request(request)?;
            let response = self
                .client
                .post(self.endpoint("chat/completions"))
                .bearer_auth(auth.bearer())
                .json(&api_request)
                .send()
                .await
                .map_err(send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let stream = try_stream! {
                let mut bytes_stream = response.bytes_stream();
                let mut pending: Vec<u8> = Vec::new();

                'read: while let Some(item) = bytes_stream.next().await {
                    let bytes = item.map_err(send_error)?;
                    pending.extend_from_slice(&bytes);

                    while let Some(newline_index) = pending.iter().position(|byte| *byte == b'\n') {
                        let raw = pending.drain(..=newline_index).collect::<Vec<_>>();
                        let line = String::from_utf8(raw)
                            .map_err(|err| ProviderError::transport(err.to_string()))?;
                        let line = line.trim();

                        let Some(payload) = line.strip_prefix("data:") else {
                            continue;
                        };

                        let payload = payload.trim();
                        if payload == "[DONE]" {
                            break 'read;
                        }

                        let chunk = parse_stream_payload(payload)?;
                        let terminal = chunk.is_terminal();
                        yield chunk;

                        if terminal {
                            break 'read;
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as OpenAiChunkStream<'a>)
        })
    }
}
