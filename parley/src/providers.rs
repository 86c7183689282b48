//! Backend construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::{BackendConfig, ConfigError};
use crate::{ChatBackend, ProviderError, ProviderId, SecretString, SecureCredentialManager};

#[derive(Debug, Clone)]
pub struct BackendBuildConfig {
    pub provider_id: ProviderId,
    pub api_key: SecretString,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl BackendBuildConfig {
    pub fn new(provider_id: ProviderId, api_key: SecretString) -> Self {
        Self {
            provider_id,
            api_key,
            base_url: None,
            timeout: Duration::from_secs(90),
        }
    }

    pub fn from_config(config: &BackendConfig, api_key: SecretString) -> Result<Self, ConfigError> {
        Ok(Self {
            provider_id: config.provider_id()?,
            api_key,
            base_url: config.base_url.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client shared by the backend and the built-in functions.
pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

pub fn build_backend(config: BackendBuildConfig) -> Result<Arc<dyn ChatBackend>, ProviderError> {
    if config.api_key.expose().trim().is_empty() {
        return Err(ProviderError::authentication(
            "backend API key must not be empty",
        ));
    }

    let credentials = Arc::new(SecureCredentialManager::new());
    credentials.set_api_key(config.provider_id, config.api_key.expose())?;
    let http = http_client(config.timeout)?;

    build_openai_backend(credentials, config, http)
}

#[cfg(feature = "provider-openai")]
fn build_openai_backend(
    credentials: Arc<SecureCredentialManager>,
    config: BackendBuildConfig,
    http: Client,
) -> Result<Arc<dyn ChatBackend>, ProviderError> {
    use pprovider::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};

    let mut transport = OpenAiHttpTransport::new(http);
    if let Some(base_url) = config.base_url {
        transport = transport.with_base_url(base_url);
    }

    let provider = OpenAiProvider::new(credentials, Arc::new(transport));
    Ok(match config.provider_id {
        ProviderId::OpenAi => Arc::new(provider),
        ProviderId::OpenAiCompatible => Arc::new(provider.compatible()),
    })
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_backend(
    _credentials: Arc<SecureCredentialManager>,
    _config: BackendBuildConfig,
    _http: Client,
) -> Result<Arc<dyn ChatBackend>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-openai feature is not enabled on parley",
    ))
}
