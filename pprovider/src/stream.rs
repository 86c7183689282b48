//! Streaming delta contracts and in-memory stream utilities.
//!
//! ```rust
//! use pprovider::{BoxedDeltaStream, DeltaChunk, VecDeltaStream};
//!
//! let stream = VecDeltaStream::new(vec![Ok(DeltaChunk::content("hello"))]);
//! let _boxed: BoxedDeltaStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{DeltaChunk, ProviderError};

/// Backend stream contract.
///
/// Invariants for consumers:
/// - Chunks are emitted in source order.
/// - Exactly one chunk per stream carries a finish reason, and it is the last
///   meaningful chunk; anything after it may be ignored.
/// - An `Err` item ends the stream from the consumer's point of view.
pub trait DeltaStream: Stream<Item = Result<DeltaChunk, ProviderError>> + Send {}

impl<T> DeltaStream for T where T: Stream<Item = Result<DeltaChunk, ProviderError>> + Send {}

pub type BoxedDeltaStream<'a> = Pin<Box<dyn DeltaStream + 'a>>;

#[derive(Debug)]
pub struct VecDeltaStream {
    chunks: VecDeque<Result<DeltaChunk, ProviderError>>,
}

impl VecDeltaStream {
    pub fn new(chunks: Vec<Result<DeltaChunk, ProviderError>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl Stream for VecDeltaStream {
    type Item = Result<DeltaChunk, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<DeltaChunk, ProviderError>>> {
        Poll::Ready(self.chunks.pop_front())
    }
}
