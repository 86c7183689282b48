//! TOML configuration for the relay.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```rust
//! use parley::ParleyConfig;
//!
//! let config = ParleyConfig::from_toml_str(
//!     r#"
//!     default_model = "gpt-4"
//!     allowed_users = ["alice"]
//!
//!     [delivery]
//!     window_capacity = 3500
//!     "#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.default_model, "gpt-4");
//! assert_eq!(config.delivery.window_capacity, 3500);
//! assert_eq!(config.turn.rate_limit_delay_secs, 10);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use pchat::{ChatPolicy, SessionDefaults, TokenBudget};
use pcommon::GenerationOptions;
use pdeliver::{MarkupFormat, WindowerConfig};
use pprovider::{ProviderId, RetryPolicy, SecretString};
use serde::Deserialize;

use crate::AccessPolicy;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Io,
    Parse,
    Invalid,
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Io, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }

    pub fn missing_api_key(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::MissingApiKey, message)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Overrides the OpenAI endpoint, e.g. for a self-hosted gateway.
    pub base_url: Option<String>,
    /// `openai` or `openai-compatible`.
    pub provider: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            provider: "openai".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: 90,
        }
    }
}

impl BackendConfig {
    pub fn provider_id(&self) -> Result<ProviderId, ConfigError> {
        crate::parse_provider_id(&self.provider).ok_or_else(|| {
            ConfigError::invalid(format!("unknown backend provider '{}'", self.provider))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurnConfig {
    pub turn_timeout_secs: u64,
    pub rate_limit_delay_secs: u64,
    /// 0 retries rate-limited calls until the turn ends.
    pub max_rate_limit_attempts: u32,
    pub reserved_margin: usize,
    pub min_budget: usize,
    /// 0 removes the cap.
    pub max_function_round_trips: u32,
    pub functions_enabled: bool,
    pub function_timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: pchat::DEFAULT_TURN_TIMEOUT.as_secs(),
            rate_limit_delay_secs: 10,
            max_rate_limit_attempts: 0,
            reserved_margin: pchat::DEFAULT_RESERVED_MARGIN,
            min_budget: pchat::DEFAULT_MIN_BUDGET,
            max_function_round_trips: pchat::DEFAULT_MAX_FUNCTION_ROUND_TRIPS,
            functions_enabled: true,
            function_timeout_secs: 60,
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

impl TurnConfig {
    pub fn function_timeout(&self) -> Duration {
        Duration::from_secs(self.function_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    pub window_capacity: usize,
    pub flush_interval_ms: u64,
    pub continuation_marker: String,
    /// `markdown`, `markdown_v2` or `plain`.
    pub format: String,
    pub show_function_calls: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            window_capacity: pdeliver::DEFAULT_WINDOW_CAPACITY,
            flush_interval_ms: pdeliver::DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            continuation_marker: pdeliver::DEFAULT_CONTINUATION_MARKER.to_string(),
            format: MarkupFormat::default().as_str().to_string(),
            show_function_calls: false,
        }
    }
}

impl DeliveryConfig {
    pub fn markup_format(&self) -> Result<MarkupFormat, ConfigError> {
        MarkupFormat::from_str(&self.format).map_err(ConfigError::invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParleyConfig {
    pub default_model: String,
    pub default_system_prompt: String,
    /// Usernames allowed to talk to the relay; empty allows everyone.
    pub allowed_users: Vec<String>,
    pub backend: BackendConfig,
    pub turn: TurnConfig,
    pub delivery: DeliveryConfig,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        let defaults = SessionDefaults::default();
        Self {
            default_model: defaults.model,
            default_system_prompt: defaults.system_prompt,
            allowed_users: Vec::new(),
            backend: BackendConfig::default(),
            turn: TurnConfig::default(),
            delivery: DeliveryConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl ParleyConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Self>(source)
            .map_err(|err| ConfigError::parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::io(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::invalid("default_model must not be empty"));
        }
        if self.backend.api_key_env.trim().is_empty() {
            return Err(ConfigError::invalid("backend.api_key_env must not be empty"));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "backend.request_timeout_secs must be greater than zero",
            ));
        }
        self.backend.provider_id()?;

        if self.turn.turn_timeout_secs == 0 {
            return Err(ConfigError::invalid("turn.turn_timeout_secs must be greater than zero"));
        }
        if self.turn.rate_limit_delay_secs == 0 {
            return Err(ConfigError::invalid(
                "turn.rate_limit_delay_secs must be greater than zero",
            ));
        }
        if self.turn.function_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "turn.function_timeout_secs must be greater than zero",
            ));
        }
        if !(0.0..=2.0).contains(&self.turn.temperature) {
            return Err(ConfigError::invalid("turn.temperature must be within 0.0..=2.0"));
        }
        if !(0.0..=1.0).contains(&self.turn.top_p) {
            return Err(ConfigError::invalid("turn.top_p must be within 0.0..=1.0"));
        }

        if self.delivery.window_capacity == 0 {
            return Err(ConfigError::invalid(
                "delivery.window_capacity must be greater than zero",
            ));
        }
        if self.delivery.flush_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "delivery.flush_interval_ms must be greater than zero",
            ));
        }
        self.delivery.markup_format()?;

        Ok(())
    }

    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults::new(&self.default_model, &self.default_system_prompt)
    }

    pub fn chat_policy(&self) -> ChatPolicy {
        let turn = &self.turn;
        let mut retry = RetryPolicy::fixed(Duration::from_secs(turn.rate_limit_delay_secs));
        if turn.max_rate_limit_attempts > 0 {
            retry = retry.with_max_attempts(turn.max_rate_limit_attempts);
        }
        let round_trips =
            (turn.max_function_round_trips > 0).then_some(turn.max_function_round_trips);

        ChatPolicy::default()
            .with_turn_timeout(Duration::from_secs(turn.turn_timeout_secs))
            .with_retry(retry)
            .with_budget(
                TokenBudget::default()
                    .with_reserved_margin(turn.reserved_margin)
                    .with_min_budget(turn.min_budget),
            )
            .with_max_function_round_trips(round_trips)
            .with_functions_enabled(turn.functions_enabled)
            .with_options(
                GenerationOptions::default()
                    .with_temperature(turn.temperature)
                    .with_top_p(turn.top_p),
            )
    }

    pub fn windower_config(&self) -> Result<WindowerConfig, ConfigError> {
        let delivery = &self.delivery;
        Ok(WindowerConfig::default()
            .with_capacity(delivery.window_capacity)
            .with_flush_interval(Duration::from_millis(delivery.flush_interval_ms))
            .with_continuation_marker(delivery.continuation_marker.clone())
            .with_format(delivery.markup_format()?))
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(&self.allowed_users)
    }

    /// Reads the API key from the process environment.
    pub fn api_key(&self) -> Result<SecretString, ConfigError> {
        self.api_key_from(|name| std::env::var(name).ok())
    }

    pub fn api_key_from(
        &self,
        lookup: impl FnOnce(&str) -> Option<String>,
    ) -> Result<SecretString, ConfigError> {
        let name = self.backend.api_key_env.as_str();
        match lookup(name) {
            Some(value) if !value.trim().is_empty() => Ok(SecretString::new(value.trim())),
            _ => Err(ConfigError::missing_api_key(format!(
                "environment variable {name} is not set"
            ))),
        }
    }
}
