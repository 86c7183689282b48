//! Runtime wiring: session store, tools, hooks and chat service from a config.

use std::sync::Arc;

use pchat::{NoopTurnHooks, TurnHooks};
use pdeliver::{DeliveryHooks, NoopDeliveryHooks, WindowerConfig};
use pobserve::{
    CompositeHooks, MetricsObservabilityHooks, SafeDeliveryHooks, SafeProviderHooks,
    SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks,
};
use pprovider::{NoopOperationHooks, ProviderOperationHooks};
use ptooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
use reqwest::Client;

use crate::config::{ConfigError, ParleyConfig};
use crate::functions::register_http_get;
use crate::{
    AccessPolicy, ChatBackend, ChatService, DefaultToolRuntime, SessionStore, ToolError,
    ToolRegistry,
};

type Observability = CompositeHooks<TracingObservabilityHooks, MetricsObservabilityHooks>;

fn observability() -> Observability {
    CompositeHooks::new(TracingObservabilityHooks, MetricsObservabilityHooks)
}

/// One hook handle per layer of the relay.
#[derive(Clone)]
pub struct RuntimeHooks {
    pub provider: Arc<dyn ProviderOperationHooks>,
    pub tools: Arc<dyn ToolRuntimeHooks>,
    pub turns: Arc<dyn TurnHooks>,
    pub delivery: Arc<dyn DeliveryHooks>,
}

impl RuntimeHooks {
    /// Tracing plus metrics on every layer, each wrapped so a panicking hook
    /// cannot take a turn down.
    pub fn observability() -> Self {
        Self {
            provider: Arc::new(SafeProviderHooks::new(observability())),
            tools: Arc::new(SafeToolHooks::new(observability())),
            turns: Arc::new(SafeTurnHooks::new(observability())),
            delivery: Arc::new(SafeDeliveryHooks::new(observability())),
        }
    }

    pub fn noop() -> Self {
        Self {
            provider: Arc::new(NoopOperationHooks),
            tools: Arc::new(NoopToolRuntimeHooks),
            turns: Arc::new(NoopTurnHooks),
            delivery: Arc::new(NoopDeliveryHooks),
        }
    }
}

/// Everything a [`Relay`](crate::Relay) needs besides its message sink.
#[derive(Clone)]
pub struct RuntimeBundle {
    pub service: ChatService,
    pub hooks: RuntimeHooks,
    pub access: AccessPolicy,
    pub windower: WindowerConfig,
    pub show_function_calls: bool,
}

/// Registry holding the built-in functions.
pub fn default_registry(client: Client) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    register_http_get(&mut registry, client)?;
    Ok(registry)
}

pub fn build_runtime(
    config: &ParleyConfig,
    backend: Arc<dyn ChatBackend>,
    registry: ToolRegistry,
) -> Result<RuntimeBundle, ConfigError> {
    build_runtime_with_hooks(config, backend, registry, RuntimeHooks::observability())
}

pub fn build_runtime_with_hooks(
    config: &ParleyConfig,
    backend: Arc<dyn ChatBackend>,
    registry: ToolRegistry,
    hooks: RuntimeHooks,
) -> Result<RuntimeBundle, ConfigError> {
    config.validate()?;

    let store = Arc::new(SessionStore::new(config.session_defaults()));
    let tool_runtime = DefaultToolRuntime::new(Arc::new(registry))
        .with_hooks(Arc::clone(&hooks.tools))
        .with_timeout(config.turn.function_timeout());

    let service = ChatService::builder(backend)
        .store(store)
        .tool_runtime(Arc::new(tool_runtime))
        .policy(config.chat_policy())
        .hooks(Arc::clone(&hooks.turns))
        .provider_hooks(Arc::clone(&hooks.provider))
        .build();

    Ok(RuntimeBundle {
        service,
        windower: config.windower_config()?,
        access: config.access_policy(),
        show_function_calls: config.delivery.show_function_calls,
        hooks,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pprovider::{
        BoxedDeltaStream, ChatBackend, ChatRequest, ProviderError, ProviderFuture, ProviderId,
    };

    use super::{RuntimeHooks, build_runtime, build_runtime_with_hooks, default_registry};
    use crate::config::ParleyConfig;
    use crate::functions::HTTP_GET;
    use crate::{SessionId, ToolRegistry};

    struct UnreachableBackend;

    impl ChatBackend for UnreachableBackend {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        fn stream_chat<'a>(
            &'a self,
            _request: ChatRequest,
        ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
            Box::pin(async { Err(ProviderError::unavailable("not wired in this test")) })
        }
    }

    #[test]
    fn bundle_carries_config_derived_settings() {
        let config = ParleyConfig::from_toml_str(
            r#"
            default_model = "gpt-4"
            default_system_prompt = "Be brief."
            allowed_users = ["alice"]

            [turn]
            max_function_round_trips = 4

            [delivery]
            window_capacity = 1000
            show_function_calls = true
            "#,
        )
        .expect("config should parse");

        let bundle = build_runtime(&config, Arc::new(UnreachableBackend), ToolRegistry::new())
            .expect("runtime should build");

        let session = bundle.service.store().get(&SessionId::from("chat-1"));
        assert_eq!(session.model, "gpt-4");
        assert_eq!(session.system_prompt, "Be brief.");
        assert_eq!(bundle.service.policy().max_function_round_trips, Some(4));
        assert_eq!(bundle.windower.capacity, 1000);
        assert!(bundle.show_function_calls);
        assert!(!bundle.access.is_open());
    }

    #[test]
    fn invalid_config_is_rejected_before_wiring() {
        let mut config = ParleyConfig::default();
        config.delivery.window_capacity = 0;

        let result = build_runtime_with_hooks(
            &config,
            Arc::new(UnreachableBackend),
            ToolRegistry::new(),
            RuntimeHooks::noop(),
        );

        assert!(result.is_err());
    }

    #[test]
    fn default_registry_exposes_http_get() {
        let registry = default_registry(reqwest::Client::new()).expect("registry");

        let names = registry
            .describe()
            .into_iter()
            .map(|definition| definition.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec![HTTP_GET.to_string()]);
    }
}
