//! Common imports for most parley embedders.

pub use crate::{
    AccessPolicy, BackendBuildConfig, ChatBackend, ChatError, ChatErrorKind, ChatPolicy,
    ChatService, Command, ConfigError, DeliveryReport, FunctionDefinition, HandleOutcome,
    InboundMessage, MarkupFormat, Message, MessageId, MessageSink, ModelCatalog, ParleyConfig,
    ProviderError, ProviderId, Relay, Role, RuntimeBundle, RuntimeHooks, SessionId, SessionStore,
    SinkError, ToolError, ToolRegistry, TurnEvent, TurnOutcome, TurnRequest, TurnSummary,
    WindowerConfig,
};
pub use crate::{
    assistant_message, build_backend, build_runtime, build_runtime_with_hooks, default_registry,
    function_message, http_client, init_tracing, parse_model_alias, parse_provider_id,
    system_message, turn, user_message,
};
pub use crate::{parley_function, parley_messages, parley_msg};
