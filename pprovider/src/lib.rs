//! Streaming chat backend contracts for the parley relay.
//!
//! A [`ChatBackend`] opens one streaming generation per [`ChatRequest`] and
//! yields [`DeltaChunk`]s until a finish reason arrives. The OpenAI adapter
//! lives behind the `provider-openai` feature.

pub mod backend;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod model;
pub mod prelude;
pub mod resilience;
pub mod stream;

#[cfg(feature = "provider-openai")]
pub mod adapters;

pub use backend::{ChatBackend, ProviderFuture};
pub use catalog::{ModelCatalog, ModelProfile};
pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    ChatRequest, DeltaChunk, FinishReason, FunctionCall, FunctionDefinition, Message, ProviderId,
    Role,
};
pub use resilience::{NoopOperationHooks, ProviderOperationHooks, RetryPolicy};
pub use stream::{BoxedDeltaStream, DeltaStream, VecDeltaStream};
