mod provider;
mod serde_api;
mod tests;
mod transport;
mod types;

pub use provider::OpenAiProvider;
pub use transport::{OpenAiChunkStream, OpenAiHttpTransport, OpenAiTransport};
pub use types::{OpenAiAuth, OpenAiFunction, OpenAiMessage, OpenAiRequest, OpenAiStreamChunk};
