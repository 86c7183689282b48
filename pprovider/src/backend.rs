use std::future::Future;
use std::pin::Pin;

use crate::{BoxedDeltaStream, ChatRequest, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A streaming chat-completion backend.
///
/// Errors returned from `stream_chat` itself happen before any delta is
/// produced (HTTP status, auth); errors yielded by the stream happen mid-way.
/// Dropping the returned stream tears the call down.
pub trait ChatBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    fn stream_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>>;
}
