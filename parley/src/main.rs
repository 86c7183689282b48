//! Terminal front end: every stdin line is an inbound message for a single
//! conversation, and replies stream to stdout.
//!
//! Usage: `parley [config.toml]`

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use parley::prelude::*;
use parley::SinkFuture;
use tokio::io::{AsyncBufReadExt, BufReader};

const CONSOLE_SESSION: &str = "console";

/// Writes each window's new text as it grows.
struct ConsoleSink {
    marker: String,
    next_id: AtomicU64,
    printed: Mutex<HashMap<MessageId, String>>,
}

impl ConsoleSink {
    fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            next_id: AtomicU64::new(1),
            printed: Mutex::new(HashMap::new()),
        }
    }

    fn settle<'t>(&self, text: &'t str) -> &'t str {
        text.strip_suffix(self.marker.as_str()).unwrap_or(text)
    }

    fn print(&self, message_id: &MessageId, text: &str) {
        let text = self.settle(text);
        let mut printed = self.printed.lock().unwrap_or_else(PoisonError::into_inner);
        let shown = printed.entry(message_id.clone()).or_default();
        if let Some(fresh) = text.strip_prefix(shown.as_str()) {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(fresh.as_bytes());
            let _ = stdout.flush();
            *shown = text.to_string();
        }
    }
}

impl MessageSink for ConsoleSink {
    fn create_message<'a>(
        &'a self,
        _session_id: &'a SessionId,
        text: &'a str,
        _formatted: bool,
        _reply_to: Option<&'a MessageId>,
    ) -> SinkFuture<'a, Result<MessageId, SinkError>> {
        Box::pin(async move {
            let id = MessageId::from(self.next_id.fetch_add(1, Ordering::Relaxed) as i64);
            self.print(&id, text);
            Ok(id)
        })
    }

    fn edit_message<'a>(
        &'a self,
        _session_id: &'a SessionId,
        message_id: &'a MessageId,
        text: &'a str,
        _formatted: bool,
    ) -> SinkFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            self.print(message_id, text);
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ParleyConfig::load(path)?,
        None => ParleyConfig::default(),
    };
    config.delivery.format = MarkupFormat::Plain.as_str().to_string();
    init_tracing(&config.log_filter);

    let backend = build_backend(BackendBuildConfig::from_config(
        &config.backend,
        config.api_key()?,
    )?)?;
    let registry = default_registry(http_client(config.backend.request_timeout())?)?;
    let bundle = build_runtime(&config, backend, registry)?;
    let sink = Arc::new(ConsoleSink::new(config.delivery.continuation_marker.clone()));
    let relay = Arc::new(Relay::from_bundle(bundle, sink));

    tracing::info!(phase = "console", event = "ready", model = %config.default_model);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        println!();
        last = Some(relay.spawn(InboundMessage::new(CONSOLE_SESSION, line)));
    }

    if let Some(handle) = last {
        handle.await?;
        println!();
    }
    Ok(())
}
