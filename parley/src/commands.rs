//! Slash commands understood by the relay.
//!
//! ```rust
//! use parley::Command;
//!
//! assert_eq!(Command::parse("/new"), Some(Command::New));
//! assert_eq!(
//!     Command::parse("/system_prompt Answer in French."),
//!     Some(Command::SystemPrompt(Some("Answer in French.".to_string())))
//! );
//! assert_eq!(Command::parse("hello"), None);
//! ```

use pchat::SessionStore;
use pprovider::ModelCatalog;
use pprovider::catalog::{GPT4_1106_PREVIEW, GPT35_TURBO_16K};

use crate::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restores default model and prompt and clears history.
    Start,
    /// Clears history.
    New,
    Gpt4,
    Gpt35,
    /// Switches to any catalog model; without an id, lists them.
    Model(Option<String>),
    /// Sets the prompt, or without text makes the next message the prompt.
    SystemPrompt(Option<String>),
    Stop,
    Unknown(String),
}

impl Command {
    /// Returns `None` for text that is not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let body = text.strip_prefix('/')?;
        let (name, argument) = match body.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (body.trim_end(), ""),
        };
        // Group chats address commands as `/name@botname`.
        let name = name.split_once('@').map_or(name, |(name, _)| name);
        if name.is_empty() {
            return None;
        }
        let argument = (!argument.is_empty()).then(|| argument.to_string());

        Some(match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "new" => Self::New,
            "gpt4" => Self::Gpt4,
            "gpt35" => Self::Gpt35,
            "model" => Self::Model(argument),
            "system_prompt" => Self::SystemPrompt(argument),
            "stop" => Self::Stop,
            _ => Self::Unknown(name.to_string()),
        })
    }

    /// Whether the command rewrites the conversation, so a running turn has
    /// to finish committing first.
    pub fn interrupts_turn(&self) -> bool {
        match self {
            Self::Start | Self::New | Self::Gpt4 | Self::Gpt35 => true,
            Self::Model(model) | Self::SystemPrompt(model) => model.is_some(),
            Self::Stop | Self::Unknown(_) => false,
        }
    }

    /// Applies the command to the session and returns the reply, if any.
    pub fn apply(
        &self,
        store: &SessionStore,
        catalog: &ModelCatalog,
        session_id: &SessionId,
    ) -> Option<String> {
        match self {
            Self::Start => {
                store.reset_to_defaults(session_id);
                Some("Welcome! Send a message to start a conversation.".to_string())
            }
            Self::New => {
                store.reset(session_id);
                Some("Conversation history cleared.".to_string())
            }
            Self::Gpt4 => Some(switch_model(store, session_id, GPT4_1106_PREVIEW)),
            Self::Gpt35 => Some(switch_model(store, session_id, GPT35_TURBO_16K)),
            Self::Model(Some(model)) => {
                let model = crate::parse_model_alias(model).unwrap_or(model.as_str());
                if catalog.contains(model) {
                    Some(switch_model(store, session_id, model))
                } else {
                    Some(format!(
                        "Unknown model: {model}. Available: {}.",
                        catalog.models().join(", ")
                    ))
                }
            }
            Self::Model(None) => Some(format!(
                "Current model: {}. Available: {}.",
                store.get(session_id).model,
                catalog.models().join(", ")
            )),
            Self::SystemPrompt(Some(prompt)) => {
                store.set_system_prompt(session_id, prompt.as_str());
                store.reset(session_id);
                Some(format!("System prompt set: {prompt}"))
            }
            Self::SystemPrompt(None) => {
                store.set_awaiting_system_prompt(session_id, true);
                Some("Send the new system prompt.".to_string())
            }
            Self::Stop => {
                store.request_stop(session_id);
                None
            }
            Self::Unknown(name) => Some(format!("Unknown command: /{name}")),
        }
    }
}

fn switch_model(store: &SessionStore, session_id: &SessionId, model: &str) -> String {
    store.set_model(session_id, model);
    store.reset(session_id);
    format!("Switched to model {model}. Conversation history cleared.")
}
