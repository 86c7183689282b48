//! Session state, token budgeting and streaming turn orchestration.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use futures_util::StreamExt;
//! use pchat::prelude::*;
//!
//! async fn reply(backend: Arc<dyn pprovider::ChatBackend>) -> Result<(), ChatError> {
//!     let service = ChatService::builder(backend).build();
//!     let mut events = service.stream_turn(TurnRequest::new("chat-1", "2+2?"))?;
//!     while let Some(event) = events.next().await {
//!         if let TurnEvent::TextDelta(text) = event {
//!             print!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod budget;
mod error;
mod hooks;
mod policy;
mod service;
mod session;
mod store;
mod tokenizer;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatPolicy, ChatService, ChatServiceBuilder, FunctionStatus,
        SessionStore, TurnEvent, TurnEventStream, TurnOutcome, TurnRequest, TurnSummary,
    };
    pub use pcommon::{SessionId, TraceId};
    pub use ptooling::{DefaultToolRuntime, ToolError, ToolRegistry, ToolRuntime};
}

pub use budget::{BudgetCheck, DEFAULT_MIN_BUDGET, DEFAULT_RESERVED_MARGIN, TokenBudget};
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{NoopTurnHooks, TurnHooks, TurnPhase};
pub use policy::{ChatPolicy, DEFAULT_MAX_FUNCTION_ROUND_TRIPS, DEFAULT_TURN_TIMEOUT};
pub use service::{ChatService, ChatServiceBuilder};
pub use session::{CancelHandle, Session, SessionDefaults, TurnLatch};
pub use store::{SessionStore, TurnGuard};
pub use tokenizer::{
    BpeTokenizer, HeuristicTokenizer, SharedTokenizer, Tokenizer, default_tokenizer,
};
pub use types::{
    FunctionStatus, TurnEvent, TurnEventStream, TurnOutcome, TurnRequest, TurnSummary,
};
pub use pcommon::{MetadataMap, SessionId, TraceId};
