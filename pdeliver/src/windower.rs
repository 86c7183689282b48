//! Splits a growing reply into bounded downstream messages.
//!
//! The windower is driven by the task that consumes the turn's events, so
//! edits for one window always go out in the order the text grew. It keeps
//! exactly what each downstream message shows and only calls the sink when a
//! window's rendering changes.

use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;

use pcommon::SessionId;
use tokio::time::Instant;

use crate::window::char_slice;
use crate::{
    DeliveryHooks, MarkupFormat, MessageId, MessageSink, NoopDeliveryHooks, OutputWindow,
    SinkError,
};

pub const DEFAULT_WINDOW_CAPACITY: usize = 4000;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_CONTINUATION_MARKER: &str = "...";

/// Stands in for a window whose slice is only whitespace; sinks refuse empty
/// messages and later windows still need something to chain to.
pub const BLANK_WINDOW_TEXT: &str = "\u{2026}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowerConfig {
    /// Characters of reply text per downstream message.
    pub capacity: usize,
    /// Minimum gap between edits that don't open a new window.
    pub flush_interval: Duration,
    /// Appended to the last window while the reply is still streaming.
    pub continuation_marker: String,
    pub format: MarkupFormat,
}

impl Default for WindowerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            continuation_marker: DEFAULT_CONTINUATION_MARKER.to_string(),
            format: MarkupFormat::default(),
        }
    }
}

impl WindowerConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn with_continuation_marker(mut self, marker: impl Into<String>) -> Self {
        self.continuation_marker = marker.into();
        self
    }

    pub fn with_format(mut self, format: MarkupFormat) -> Self {
        self.format = format;
        self
    }

    /// Shrinks the capacity so a window plus its marker fits the sink.
    pub fn fitted_to(mut self, max_content_len: Option<usize>) -> Self {
        if let Some(max) = max_content_len {
            let marker = self.continuation_marker.chars().count();
            if self.capacity + marker > max {
                self.capacity = max.saturating_sub(marker).max(1);
            }
        }
        self
    }
}

/// What one flush did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub created: usize,
    pub edited: usize,
    pub fallbacks: usize,
    pub failures: usize,
    pub throttled: bool,
}

impl FlushReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.edited == 0 && self.fallbacks == 0 && self.failures == 0
    }
}

impl AddAssign for FlushReport {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.edited += other.edited;
        self.fallbacks += other.fallbacks;
        self.failures += other.failures;
        self.throttled |= other.throttled;
    }
}

enum Target {
    Create { reply_to: Option<MessageId> },
    Edit(MessageId),
}

struct Delivered {
    created: Option<MessageId>,
    text: String,
    formatted: bool,
}

pub struct Windower {
    session_id: SessionId,
    reply_to: Option<MessageId>,
    config: WindowerConfig,
    hooks: Arc<dyn DeliveryHooks>,
    windows: Vec<OutputWindow>,
    last_flush: Option<Instant>,
}

impl Windower {
    /// `reply_to` is the inbound message the first window answers.
    pub fn new(session_id: SessionId, reply_to: Option<MessageId>, config: WindowerConfig) -> Self {
        Self {
            session_id,
            reply_to,
            config,
            hooks: Arc::new(NoopDeliveryHooks),
            windows: Vec::new(),
            last_flush: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DeliveryHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &WindowerConfig {
        &self.config
    }

    pub fn windows(&self) -> &[OutputWindow] {
        &self.windows
    }

    pub fn into_windows(self) -> Vec<OutputWindow> {
        self.windows
    }

    fn render(&self, slice: &str, last: bool, is_final: bool) -> (String, String) {
        let marker = if last && !is_final {
            self.config.continuation_marker.as_str()
        } else {
            ""
        };
        let plain = format!("{}{marker}", slice.trim());
        if plain.is_empty() {
            return (BLANK_WINDOW_TEXT.to_string(), BLANK_WINDOW_TEXT.to_string());
        }
        let rich = format!("{}{marker}", self.config.format.escape(slice).trim());
        (rich, plain)
    }

    /// Brings every window in line with `full_text`.
    ///
    /// Non-final calls are throttled to one per flush interval unless the
    /// text has crossed into a new window. Sink failures are reported through
    /// hooks and the returned report, never as errors.
    pub async fn on_buffer_grown(
        &mut self,
        sink: &dyn MessageSink,
        full_text: &str,
        is_final: bool,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        let capacity = self.config.capacity.max(1);
        let needed = full_text.chars().count().div_ceil(capacity);
        if needed == 0 {
            return report;
        }

        let opens_window = needed > self.windows.len();
        if !is_final && !opens_window {
            if let Some(last) = self.last_flush {
                if last.elapsed() < self.config.flush_interval {
                    self.hooks.on_flush_throttled(&self.session_id);
                    report.throttled = true;
                    return report;
                }
            }
        }
        self.last_flush = Some(Instant::now());

        for index in 0..needed {
            let offset = index * capacity;
            let slice = char_slice(full_text, offset, capacity);
            let (rich, plain) = self.render(slice, index + 1 == needed, is_final);

            let target = match self.windows.get(index) {
                Some(window) => {
                    let unchanged = if window.formatted {
                        window.rendered == rich
                    } else {
                        window.rendered == plain || window.rendered == rich
                    };
                    if unchanged {
                        continue;
                    }
                    Target::Edit(window.message_id.clone())
                }
                None => {
                    let reply_to = match index {
                        0 => self.reply_to.clone(),
                        _ => self
                            .windows
                            .get(index - 1)
                            .map(|previous| previous.message_id.clone()),
                    };
                    Target::Create { reply_to }
                }
            };

            let Some(delivered) = self
                .deliver(sink, index, &target, rich, plain, &mut report)
                .await
            else {
                if matches!(target, Target::Create { .. }) {
                    break;
                }
                continue;
            };

            if let Some(message_id) = delivered.created {
                let mut window = OutputWindow::new(offset, capacity, message_id);
                window.rendered = delivered.text;
                window.formatted = delivered.formatted;
                self.windows.push(window);
                report.created += 1;
                self.hooks.on_window_created(&self.session_id, index);
            } else if let Some(window) = self.windows.get_mut(index) {
                window.rendered = delivered.text;
                window.formatted = delivered.formatted;
                report.edited += 1;
                self.hooks.on_window_edited(&self.session_id, index);
            }
        }

        report
    }

    /// Sends `rich`, then `plain` if the surface refused the rich payload.
    async fn deliver(
        &self,
        sink: &dyn MessageSink,
        index: usize,
        target: &Target,
        rich: String,
        plain: String,
        report: &mut FlushReport,
    ) -> Option<Delivered> {
        let formatted = self.config.format.is_formatted();
        let error = match send(sink, &self.session_id, target, &rich, formatted).await {
            Ok(created) => {
                return Some(Delivered {
                    created,
                    text: rich,
                    formatted,
                });
            }
            Err(error) => error,
        };

        if !formatted {
            report.failures += 1;
            self.hooks.on_delivery_failed(&self.session_id, index, &error);
            return None;
        }

        self.hooks.on_formatting_rejected(&self.session_id, index, &error);
        report.fallbacks += 1;
        match send(sink, &self.session_id, target, &plain, false).await {
            Ok(created) => Some(Delivered {
                created,
                text: plain,
                formatted: false,
            }),
            Err(error) => {
                report.failures += 1;
                self.hooks.on_delivery_failed(&self.session_id, index, &error);
                None
            }
        }
    }
}

async fn send(
    sink: &dyn MessageSink,
    session_id: &SessionId,
    target: &Target,
    text: &str,
    formatted: bool,
) -> Result<Option<MessageId>, SinkError> {
    match target {
        Target::Create { reply_to } => sink
            .create_message(session_id, text, formatted, reply_to.as_ref())
            .await
            .map(Some),
        Target::Edit(message_id) => sink
            .edit_message(session_id, message_id, text, formatted)
            .await
            .map(|()| None),
    }
}
