//! Per-session state and the turn cancellation handle.

use pcommon::SessionId;
use pprovider::Message;
use tokio_util::sync::CancellationToken;

/// Cancellation handle for one in-flight turn.
///
/// `cancel` may be called any number of times from any task. The `finished`
/// side is released exactly once, when the turn commits its output.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    turn_id: u64,
    cancel: CancellationToken,
    finished: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new(turn_id: u64) -> Self {
        Self {
            turn_id,
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
        }
    }

    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn latch(&self) -> TurnLatch {
        TurnLatch {
            finished: self.finished.clone(),
        }
    }

    pub(crate) fn finish(&self) {
        self.finished.cancel();
    }
}

/// Resolves once the turn it was taken from has committed.
#[derive(Debug, Clone)]
pub struct TurnLatch {
    finished: CancellationToken,
}

impl TurnLatch {
    pub async fn wait(&self) {
        self.finished.cancelled().await;
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_cancelled()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDefaults {
    pub model: String,
    pub system_prompt: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            model: pprovider::catalog::GPT4_1106_PREVIEW.to_string(),
            system_prompt: "You are a helpful AI assistant.".to_string(),
        }
    }
}

impl SessionDefaults {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub model: String,
    pub system_prompt: String,
    pub history: Vec<Message>,
    /// Text produced so far by the turn in flight.
    pub buffer: String,
    /// Set by a bare `system_prompt` command; the next plain message becomes
    /// the prompt instead of starting a turn.
    pub awaiting_system_prompt: bool,
    pub(crate) turn: Option<CancelHandle>,
}

impl Session {
    pub fn new(id: SessionId, defaults: &SessionDefaults) -> Self {
        Self {
            id,
            model: defaults.model.clone(),
            system_prompt: defaults.system_prompt.clone(),
            history: Vec::new(),
            buffer: String::new(),
            awaiting_system_prompt: false,
            turn: None,
        }
    }

    pub fn has_live_turn(&self) -> bool {
        self.turn.is_some()
    }

    /// The system prompt followed by the history, as sent to the backend.
    pub fn prompt_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            messages.push(Message::system(self.system_prompt.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages
    }

    pub(crate) fn reset_conversation(&mut self) {
        self.history.clear();
        self.buffer.clear();
    }
}
