//! In-memory session store with per-session locking.
//!
//! The map is sharded by `dashmap`; each session sits behind its own mutex, so
//! work on one conversation never waits on another. No lock is held across an
//! `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use pcommon::SessionId;
use pprovider::Message;

use crate::{CancelHandle, ChatError, Session, SessionDefaults, TurnLatch};

type SharedSession = Arc<Mutex<Session>>;

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SharedSession>,
    defaults: SessionDefaults,
    next_turn: AtomicU64,
}

impl SessionStore {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            sessions: DashMap::new(),
            defaults,
            next_turn: AtomicU64::new(0),
        }
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    fn entry(&self, id: &SessionId) -> SharedSession {
        if let Some(session) = self.sessions.get(id) {
            return Arc::clone(session.value());
        }

        let session = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.clone(), &self.defaults))));
        Arc::clone(session.value())
    }

    fn with_session<R>(&self, id: &SessionId, apply: impl FnOnce(&mut Session) -> R) -> R {
        let session = self.entry(id);
        let mut guard = lock(&session);
        apply(&mut guard)
    }

    /// Snapshot of the session, created with defaults on first access.
    pub fn get(&self, id: &SessionId) -> Session {
        self.with_session(id, |session| session.clone())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Clears history and buffer; model and system prompt are kept.
    pub fn reset(&self, id: &SessionId) {
        self.with_session(id, Session::reset_conversation);
    }

    /// Clears the conversation and restores the default model and prompt.
    pub fn reset_to_defaults(&self, id: &SessionId) {
        let defaults = self.defaults.clone();
        self.with_session(id, |session| {
            session.reset_conversation();
            session.model = defaults.model;
            session.system_prompt = defaults.system_prompt;
            session.awaiting_system_prompt = false;
        });
    }

    pub fn set_model(&self, id: &SessionId, model: impl Into<String>) {
        let model = model.into();
        self.with_session(id, |session| session.model = model);
    }

    pub fn set_system_prompt(&self, id: &SessionId, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.with_session(id, |session| {
            session.system_prompt = prompt;
            session.awaiting_system_prompt = false;
        });
    }

    pub fn set_awaiting_system_prompt(&self, id: &SessionId, awaiting: bool) {
        self.with_session(id, |session| session.awaiting_system_prompt = awaiting);
    }

    /// Returns and clears the awaiting-system-prompt flag.
    pub fn take_awaiting_system_prompt(&self, id: &SessionId) -> bool {
        self.with_session(id, |session| std::mem::take(&mut session.awaiting_system_prompt))
    }

    pub fn history(&self, id: &SessionId) -> Vec<Message> {
        self.with_session(id, |session| session.history.clone())
    }

    /// Cancels the live turn, if any. Returns whether one was running.
    pub fn request_stop(&self, id: &SessionId) -> bool {
        self.preempt(id).is_some()
    }

    /// Cancels the live turn and hands back a latch that resolves once that
    /// turn has committed its partial output.
    pub fn preempt(&self, id: &SessionId) -> Option<TurnLatch> {
        let session = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;
        let guard = lock(&session);
        let handle = guard.turn.as_ref()?;
        handle.cancel();
        Some(handle.latch())
    }

    /// Installs a fresh cancellation handle for a new turn.
    ///
    /// Fails with `TurnInFlight` while another turn still holds the session;
    /// callers pre-empt first.
    pub fn begin_turn(&self, id: &SessionId) -> Result<TurnGuard, ChatError> {
        let session = self.entry(id);
        let turn_id = self.next_turn.fetch_add(1, Ordering::Relaxed) + 1;

        let handle = {
            let mut guard = lock(&session);
            if guard.turn.is_some() {
                return Err(ChatError::turn_in_flight(format!(
                    "session '{id}' already has a turn in flight"
                )));
            }

            let handle = CancelHandle::new(turn_id);
            guard.turn = Some(handle.clone());
            guard.buffer.clear();
            handle
        };

        Ok(TurnGuard {
            session,
            handle,
            committed: false,
        })
    }
}

/// Exclusive access to a session for the duration of one turn.
///
/// Dropping the guard without calling [`TurnGuard::commit`] commits anyway,
/// so an abandoned turn still records its partial output and releases the
/// session.
#[derive(Debug)]
pub struct TurnGuard {
    session: SharedSession,
    handle: CancelHandle,
    committed: bool,
}

impl TurnGuard {
    pub fn handle(&self) -> &CancelHandle {
        &self.handle
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.session).clone()
    }

    pub fn append_history(&self, message: Message) {
        lock(&self.session).history.push(message);
    }

    pub fn append_buffer(&self, text: &str) {
        lock(&self.session).buffer.push_str(text);
    }

    pub fn buffer(&self) -> String {
        lock(&self.session).buffer.clone()
    }

    /// Trims the buffer into an assistant message, clears the handle and
    /// releases anyone waiting on the turn's latch. Runs at most once.
    pub fn commit(&mut self) -> Option<String> {
        if self.committed {
            return None;
        }
        self.committed = true;

        let committed = {
            let mut session = lock(&self.session);
            let text = std::mem::take(&mut session.buffer).trim().to_string();
            if !text.is_empty() {
                session.history.push(Message::assistant(text.clone()));
            }

            let owns_handle = session
                .turn
                .as_ref()
                .is_some_and(|turn| turn.turn_id() == self.handle.turn_id());
            if owns_handle {
                session.turn = None;
            }

            (!text.is_empty()).then_some(text)
        };

        self.handle.finish();
        committed
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.commit();
    }
}
