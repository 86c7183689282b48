//! Message sink errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// The surface refused the rich-text payload; a plain retry may succeed.
    FormattingRejected,
    MessageTooLong,
    NotFound,
    Transport,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    pub kind: SinkErrorKind,
    pub message: String,
}

impl SinkError {
    pub fn new(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn formatting_rejected(message: impl Into<String>) -> Self {
        Self::new(SinkErrorKind::FormattingRejected, message)
    }

    pub fn message_too_long(message: impl Into<String>) -> Self {
        Self::new(SinkErrorKind::MessageTooLong, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SinkErrorKind::NotFound, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(SinkErrorKind::Transport, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(SinkErrorKind::Other, message)
    }

    /// Whether resending the same text without formatting could succeed.
    pub fn allows_plain_fallback(&self) -> bool {
        matches!(
            self.kind,
            SinkErrorKind::FormattingRejected | SinkErrorKind::MessageTooLong
        )
    }
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for SinkError {}
