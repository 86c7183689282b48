//! OpenAI-backed [`ChatBackend`] over a pluggable transport.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::{
    BoxedDeltaStream, ChatBackend, ChatRequest, DeltaChunk, ProviderError, ProviderFuture,
    ProviderId, SecureCredentialManager,
};

use super::transport::OpenAiTransport;
use super::types::{OpenAiAuth, OpenAiFunction, OpenAiMessage, OpenAiRequest};

#[derive(Clone)]
pub struct OpenAiProvider {
    id: ProviderId,
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            id: ProviderId::OpenAi,
            credentials,
            transport,
        }
    }

    /// Marks the backend as a self-hosted endpoint speaking the same protocol.
    pub fn compatible(mut self) -> Self {
        self.id = ProviderId::OpenAiCompatible;
        self
    }

    fn resolve_auth(&self) -> Result<OpenAiAuth, ProviderError> {
        self.credentials
            .api_key(self.id)?
            .map(OpenAiAuth::ApiKey)
            .ok_or_else(|| {
                ProviderError::authentication(format!("no API key configured for {}", self.id))
            })
    }

    pub(crate) fn build_openai_request(&self, request: ChatRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(OpenAiMessage::from)
                .collect(),
            functions: request
                .functions
                .into_iter()
                .map(OpenAiFunction::from)
                .collect(),
            temperature: request.options.temperature,
            top_p: request.options.top_p,
            max_tokens: request.max_tokens,
            stream: true,
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("id", &self.id)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl ChatBackend for OpenAiProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn stream_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let auth = self.resolve_auth()?;
            let openai_request = self.build_openai_request(request);
            let mut chunks = self.transport.stream(openai_request, auth).await?;

            let stream = try_stream! {
                while let Some(chunk) = chunks.next().await {
                    yield DeltaChunk::from(chunk?);
                }
            };

            Ok(Box::pin(stream) as BoxedDeltaStream<'a>)
        })
    }
}
