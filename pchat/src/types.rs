//! Turn requests, events and outcomes.

use std::pin::Pin;

use futures_core::Stream;
use pcommon::{SessionId, TraceId};
use pprovider::FunctionCall;

use crate::ChatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub session_id: SessionId,
    pub input: String,
    pub trace_id: Option<TraceId>,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<SessionId>, input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            input: input.into(),
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    BudgetExhausted { used: usize },
    Cancelled,
    TimedOut,
    Failed(ChatError),
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::BudgetExhausted { .. } => "budget_exhausted",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    pub session_id: SessionId,
    pub outcome: TurnOutcome,
    /// Trimmed assistant text added to history, if any.
    pub committed: Option<String>,
    pub backend_calls: u32,
    pub rate_limit_retries: u32,
    pub function_calls: u32,
    pub function_round_limit_reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionStatus {
    Succeeded,
    Failed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Assistant text, also appended to the session buffer.
    TextDelta(String),
    /// User-facing status text that is not part of the conversation.
    Notice(String),
    FunctionCall(FunctionCall),
    FunctionResult {
        name: String,
        output: String,
        status: FunctionStatus,
    },
    TurnComplete(TurnSummary),
}

pub type TurnEventStream<'a> = Pin<Box<dyn Stream<Item = TurnEvent> + Send + 'a>>;
