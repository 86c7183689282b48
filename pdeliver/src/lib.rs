//! Incremental delivery of streamed replies as bounded, editable messages.
//!
//! ```rust
//! use pcommon::SessionId;
//! use pdeliver::{MemorySink, Windower, WindowerConfig};
//!
//! # futures_util::FutureExt::now_or_never(async {
//! let sink = MemorySink::new();
//! let mut windower = Windower::new(SessionId::from("chat-1"), None, WindowerConfig::default());
//!
//! windower.on_buffer_grown(&sink, "Hello", false).await;
//! windower.on_buffer_grown(&sink, "Hello", true).await;
//!
//! let window = &windower.windows()[0];
//! assert_eq!(sink.text_of(&window.message_id).as_deref(), Some("Hello"));
//! # });
//! ```

mod deliver;
mod error;
mod hooks;
mod markup;
mod sink;
mod window;
mod windower;

pub mod prelude {
    pub use crate::{
        DeliveryHooks, DeliveryReport, MarkupFormat, MemorySink, MessageId, MessageSink,
        SinkError, SinkErrorKind, TurnDelivery, Windower, WindowerConfig,
    };
}

pub use deliver::{DeliveryReport, TurnDelivery};
pub use error::{SinkError, SinkErrorKind};
pub use hooks::{DeliveryHooks, NoopDeliveryHooks};
pub use markup::MarkupFormat;
pub use sink::{MemorySink, MessageId, MessageSink, SinkCall, SinkFuture};
pub use window::OutputWindow;
pub use windower::{
    BLANK_WINDOW_TEXT, DEFAULT_CONTINUATION_MARKER, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_WINDOW_CAPACITY, FlushReport, Windower, WindowerConfig,
};
