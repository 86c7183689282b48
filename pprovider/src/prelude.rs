//! Common `pprovider` imports for downstream crates.

pub use crate::{
    BoxedDeltaStream, ChatBackend, ChatRequest, DeltaChunk, FinishReason, FunctionCall,
    FunctionDefinition, Message, ModelCatalog, ModelProfile, NoopOperationHooks, ProviderError,
    ProviderErrorKind, ProviderId, ProviderOperationHooks, RetryPolicy, Role, VecDeltaStream,
};
pub use pcommon::{BoxFuture, GenerationOptions, MetadataMap};
