//! Inbound message handling: access check, commands, pre-emption and
//! delivery of the streamed reply.
//!
//! Each inbound message runs on its own task. A new plain message for a
//! session cancels that session's running turn, waits for it to commit, and
//! only then starts the next one.

use std::sync::Arc;

use pchat::{ChatErrorKind, TurnRequest};
use pdeliver::{
    DeliveryHooks, DeliveryReport, MessageId, MessageSink, NoopDeliveryHooks, TurnDelivery,
    WindowerConfig,
};
use tokio::task::JoinHandle;

use crate::runtime::RuntimeBundle;
use crate::{AccessPolicy, ChatError, ChatService, Command, SessionId};

pub const ACCESS_DENIED_REPLY: &str = "You are not allowed to use this bot.";
pub const SYSTEM_PROMPT_SET_REPLY: &str = "System prompt set.";

/// A racing handler can claim the session between our pre-emption and
/// `stream_turn`; after this many rounds the message is dropped.
const MAX_START_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub session_id: SessionId,
    /// Username of the sender, when the surface has one.
    pub sender: Option<String>,
    pub text: String,
    /// The inbound message itself; the reply threads under it.
    pub message_id: Option<MessageId>,
}

impl InboundMessage {
    pub fn new(session_id: impl Into<SessionId>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender: None,
            text: text.into(),
            message_id: None,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<MessageId>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Refused,
    Command(Command),
    SystemPromptSet,
    Delivered(Box<DeliveryReport>),
    Rejected(ChatError),
}

pub struct Relay {
    service: ChatService,
    sink: Arc<dyn MessageSink>,
    access: AccessPolicy,
    windower: WindowerConfig,
    show_function_calls: bool,
    delivery_hooks: Arc<dyn DeliveryHooks>,
}

impl Relay {
    pub fn new(service: ChatService, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            service,
            sink,
            access: AccessPolicy::allow_all(),
            windower: WindowerConfig::default(),
            show_function_calls: false,
            delivery_hooks: Arc::new(NoopDeliveryHooks),
        }
    }

    pub fn from_bundle(bundle: RuntimeBundle, sink: Arc<dyn MessageSink>) -> Self {
        Self::new(bundle.service, sink)
            .with_access(bundle.access)
            .with_windower_config(bundle.windower)
            .with_function_calls_shown(bundle.show_function_calls)
            .with_delivery_hooks(bundle.hooks.delivery)
    }

    pub fn with_access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    pub fn with_windower_config(mut self, windower: WindowerConfig) -> Self {
        self.windower = windower;
        self
    }

    pub fn with_function_calls_shown(mut self, show: bool) -> Self {
        self.show_function_calls = show;
        self
    }

    pub fn with_delivery_hooks(mut self, hooks: Arc<dyn DeliveryHooks>) -> Self {
        self.delivery_hooks = hooks;
        self
    }

    pub fn service(&self) -> &ChatService {
        &self.service
    }

    /// Handles `message` on its own task.
    pub fn spawn(self: &Arc<Self>, message: InboundMessage) -> JoinHandle<HandleOutcome> {
        let relay = Arc::clone(self);
        tokio::spawn(async move { relay.handle(message).await })
    }

    pub async fn handle(&self, message: InboundMessage) -> HandleOutcome {
        let session_id = message.session_id.clone();

        if !self.access.allows(message.sender.as_deref()) {
            tracing::warn!(
                phase = "relay",
                event = "access_denied",
                session_id = %session_id,
                sender = message.sender.as_deref()
            );
            self.reply(&session_id, ACCESS_DENIED_REPLY).await;
            return HandleOutcome::Refused;
        }

        let store = self.service.store();

        if let Some(command) = Command::parse(&message.text) {
            tracing::info!(
                phase = "relay",
                event = "command",
                session_id = %session_id,
                command = ?command
            );
            if command.interrupts_turn() {
                self.preempt(&session_id).await;
            }
            if let Some(reply) = command.apply(&store, self.service.catalog(), &session_id) {
                self.reply(&session_id, &reply).await;
            }
            return HandleOutcome::Command(command);
        }

        if store.take_awaiting_system_prompt(&session_id) {
            self.preempt(&session_id).await;
            store.set_system_prompt(&session_id, message.text.trim());
            store.reset(&session_id);
            self.reply(&session_id, SYSTEM_PROMPT_SET_REPLY).await;
            return HandleOutcome::SystemPromptSet;
        }

        self.run_turn(message).await
    }

    async fn run_turn(&self, message: InboundMessage) -> HandleOutcome {
        let session_id = message.session_id.clone();
        let mut request = TurnRequest::new(session_id.clone(), message.text);
        if let Some(message_id) = &message.message_id {
            request = request.with_trace_id(format!("{session_id}:{message_id}"));
        }

        let mut attempts = 0;
        let events = loop {
            attempts += 1;
            self.preempt(&session_id).await;
            match self.service.stream_turn(request.clone()) {
                Ok(events) => break events,
                Err(err)
                    if err.kind == ChatErrorKind::TurnInFlight && attempts < MAX_START_ATTEMPTS =>
                {
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        phase = "relay",
                        event = "turn_rejected",
                        session_id = %session_id,
                        error = %err
                    );
                    return HandleOutcome::Rejected(err);
                }
            }
        };

        let report = TurnDelivery::new(
            self.sink.as_ref(),
            session_id,
            message.message_id,
            self.windower.clone(),
        )
        .with_hooks(Arc::clone(&self.delivery_hooks))
        .with_function_calls_shown(self.show_function_calls)
        .run(events)
        .await;

        HandleOutcome::Delivered(Box::new(report))
    }

    async fn preempt(&self, session_id: &SessionId) {
        if let Some(latch) = self.service.store().preempt(session_id) {
            latch.wait().await;
        }
    }

    async fn reply(&self, session_id: &SessionId, text: &str) {
        if let Err(err) = self.sink.create_message(session_id, text, false, None).await {
            tracing::error!(
                phase = "relay",
                event = "reply_failed",
                session_id = %session_id,
                error = %err
            );
        }
    }
}
