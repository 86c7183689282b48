//! Unified facade over the parley workspace crates.
//!
//! This crate is the single dependency for most embedders: it re-exports the
//! session, backend, function, delivery and observability crates, loads the
//! TOML configuration, wires them into a [`Relay`], and provides the command
//! surface and the built-in `http_get` function.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use parley::prelude::*;
//!
//! # async fn run(sink: Arc<dyn MessageSink>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ParleyConfig::load("parley.toml")?;
//! init_tracing(&config.log_filter);
//!
//! let backend = build_backend(BackendBuildConfig::from_config(&config.backend, config.api_key()?)?)?;
//! let registry = default_registry(http_client(config.backend.request_timeout())?)?;
//! let relay = Arc::new(Relay::from_bundle(build_runtime(&config, backend, registry)?, sink));
//!
//! relay
//!     .spawn(InboundMessage::new(42_i64, "2+2?").with_sender("alice"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod access;
mod macros;

pub mod commands;
pub mod config;
pub mod functions;
pub mod prelude;
pub mod providers;
pub mod relay;
pub mod runtime;
pub mod telemetry;
pub mod util;

pub use pchat;
pub use pcommon;
pub use pdeliver;
pub use pobserve;
pub use pprovider;
pub use ptooling;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

pub use pchat::{
    BudgetCheck, ChatError, ChatErrorKind, ChatPolicy, ChatService, ChatServiceBuilder,
    FunctionStatus, Session, SessionDefaults, SessionStore, TokenBudget, TurnEvent,
    TurnEventStream, TurnHooks, TurnOutcome, TurnRequest, TurnSummary,
};
pub use pcommon::{BoxFuture, GenerationOptions, MetadataMap, SessionId, TraceId};
pub use pdeliver::{
    DeliveryHooks, DeliveryReport, MarkupFormat, MemorySink, MessageId, MessageSink, SinkCall,
    SinkError, SinkErrorKind, SinkFuture, TurnDelivery, Windower, WindowerConfig,
};
pub use pobserve::{CompositeHooks, MetricsObservabilityHooks, TracingObservabilityHooks};
pub use pprovider::{
    BoxedDeltaStream, ChatBackend, ChatRequest, DeltaChunk, FinishReason, FunctionCall,
    FunctionDefinition, Message, ModelCatalog, ModelProfile, ProviderError, ProviderErrorKind,
    ProviderFuture, ProviderId, RetryPolicy, Role, SecretString, SecureCredentialManager,
    VecDeltaStream,
};
pub use ptooling::{
    DefaultToolRuntime, ToolError, ToolErrorKind, ToolExecutionContext, ToolRegistry, ToolRuntime,
};

pub use access::AccessPolicy;
pub use commands::Command;
pub use config::{
    BackendConfig, ConfigError, ConfigErrorKind, DeliveryConfig, ParleyConfig, TurnConfig,
};
pub use providers::{BackendBuildConfig, build_backend, http_client};
pub use relay::{HandleOutcome, InboundMessage, Relay};
pub use runtime::{
    RuntimeBundle, RuntimeHooks, build_runtime, build_runtime_with_hooks, default_registry,
};
pub use telemetry::init_tracing;
pub use util::{
    assistant_message, function_message, parse_model_alias, parse_provider_id, system_message,
    turn, user_message,
};

#[cfg(test)]
mod tests {
    use crate::Role;

    #[test]
    fn parley_msg_macro_creates_expected_message() {
        let message = crate::parley_msg!(user => "hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hello");

        let result = crate::parley_msg!(function "http_get" => "{}");
        assert_eq!(result.role, Role::Function);
        assert_eq!(result.name.as_deref(), Some("http_get"));
    }

    #[test]
    fn parley_messages_macro_builds_message_vector() {
        let messages = crate::parley_messages![
            system => "You are concise.",
            user => "2+2?",
            assistant => "4",
        ];

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[2].content, "4");
        assert!(crate::parley_messages![].is_empty());
    }

    #[test]
    fn parley_function_macro_serializes_schema() {
        let definition = crate::parley_function!("noop", "Does nothing", { "type": "object" });

        assert_eq!(definition.name, "noop");
        assert_eq!(definition.parameters, "{\"type\":\"object\"}");
    }
}
