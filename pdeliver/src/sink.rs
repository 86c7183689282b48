//! Outgoing message surface contract.
//!
//! ```rust
//! use pdeliver::{MemorySink, MessageSink};
//! use pcommon::SessionId;
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let sink = MemorySink::new();
//! let session = SessionId::from("chat-1");
//! let id = sink.create_message(&session, "hello...", true, None).await.unwrap();
//! sink.edit_message(&session, &id, "hello", true).await.unwrap();
//! assert_eq!(sink.text_of(&id).as_deref(), Some("hello"));
//! # });
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

use pcommon::{BoxFuture, SessionId};

use crate::SinkError;

pub type SinkFuture<'a, T> = BoxFuture<'a, T>;

/// Identity of a message already posted to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for MessageId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub trait MessageSink: Send + Sync {
    /// Posts a new message, optionally as a reply to `reply_to`.
    fn create_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        text: &'a str,
        formatted: bool,
        reply_to: Option<&'a MessageId>,
    ) -> SinkFuture<'a, Result<MessageId, SinkError>>;

    fn edit_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        message_id: &'a MessageId,
        text: &'a str,
        formatted: bool,
    ) -> SinkFuture<'a, Result<(), SinkError>>;

    /// Longest text the surface accepts in one message, if bounded.
    fn max_content_len(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Create {
        session_id: SessionId,
        text: String,
        formatted: bool,
        reply_to: Option<MessageId>,
    },
    Edit {
        session_id: SessionId,
        message_id: MessageId,
        text: String,
        formatted: bool,
    },
}

impl SinkCall {
    pub fn text(&self) -> &str {
        match self {
            Self::Create { text, .. } | Self::Edit { text, .. } => text,
        }
    }

    pub fn is_formatted(&self) -> bool {
        match self {
            Self::Create { formatted, .. } | Self::Edit { formatted, .. } => *formatted,
        }
    }
}

#[derive(Debug, Default)]
struct MemorySinkState {
    next_id: i64,
    calls: Vec<SinkCall>,
    messages: HashMap<MessageId, String>,
}

/// In-memory sink that records every call.
///
/// Useful for local runs and tests; it can be told to reject formatted
/// payloads to exercise the plain fallback.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemorySinkState>,
    reject_formatted: bool,
    max_content_len: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_formatted(mut self) -> Self {
        self.reject_formatted = true;
        self
    }

    pub fn with_max_content_len(mut self, max_content_len: usize) -> Self {
        self.max_content_len = Some(max_content_len);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemorySinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn text_of(&self, message_id: &MessageId) -> Option<String> {
        self.lock().messages.get(message_id).cloned()
    }

    fn check(&self, text: &str, formatted: bool) -> Result<(), SinkError> {
        if formatted && self.reject_formatted {
            return Err(SinkError::formatting_rejected("can't parse entities"));
        }
        if let Some(max) = self.max_content_len {
            if text.chars().count() > max {
                return Err(SinkError::message_too_long(format!(
                    "message exceeds {max} characters"
                )));
            }
        }
        Ok(())
    }
}

impl MessageSink for MemorySink {
    fn create_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        text: &'a str,
        formatted: bool,
        reply_to: Option<&'a MessageId>,
    ) -> SinkFuture<'a, Result<MessageId, SinkError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(SinkCall::Create {
                session_id: session_id.clone(),
                text: text.to_string(),
                formatted,
                reply_to: reply_to.cloned(),
            });
            self.check(text, formatted)?;

            state.next_id += 1;
            let id = MessageId::from(state.next_id);
            state.messages.insert(id.clone(), text.to_string());
            Ok(id)
        })
    }

    fn edit_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        message_id: &'a MessageId,
        text: &'a str,
        formatted: bool,
    ) -> SinkFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.calls.push(SinkCall::Edit {
                session_id: session_id.clone(),
                message_id: message_id.clone(),
                text: text.to_string(),
                formatted,
            });
            self.check(text, formatted)?;

            match state.messages.get_mut(message_id) {
                Some(current) => {
                    *current = text.to_string();
                    Ok(())
                }
                None => Err(SinkError::not_found(format!("message {message_id} not found"))),
            }
        })
    }

    fn max_content_len(&self) -> Option<usize> {
        self.max_content_len
    }
}
