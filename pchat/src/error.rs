//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    TurnInFlight,
    BudgetExhausted,
    RateLimited,
    BackendUnavailable,
    FunctionInvocationFailed,
    DuplicateFunctionCall,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn turn_in_flight(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::TurnInFlight, message)
    }

    pub fn budget_exhausted(used: usize) -> Self {
        Self::new(
            ChatErrorKind::BudgetExhausted,
            format!("context size exhausted, {used} tokens used"),
        )
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::BackendUnavailable, message)
    }

    pub fn function_failed(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::FunctionInvocationFailed, message)
    }

    pub fn duplicate_call(name: &str) -> Self {
        Self::new(
            ChatErrorKind::DuplicateFunctionCall,
            format!("duplicate call rejected: '{name}' was already called with these arguments"),
        )
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    /// Text shown to the end user for outcomes that are reported.
    pub fn user_notice(&self) -> String {
        match self.kind {
            ChatErrorKind::BudgetExhausted => format!("Error: {}.", self.message),
            ChatErrorKind::BackendUnavailable => {
                format!("failed to call the language model: {}", self.message)
            }
            _ => self.message.clone(),
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        if value.is_rate_limited() {
            ChatError::new(ChatErrorKind::RateLimited, value.message)
        } else {
            ChatError::backend_unavailable(value.message)
        }
    }
}
