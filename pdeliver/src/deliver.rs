//! Drives a windower from a turn's event stream.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use pchat::{TurnEvent, TurnSummary};
use pcommon::SessionId;

use crate::{
    DeliveryHooks, FlushReport, MessageId, MessageSink, OutputWindow, Windower, WindowerConfig,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// `None` when the event stream ended without a completion event.
    pub summary: Option<TurnSummary>,
    /// Everything shown to the user, notices included.
    pub text: String,
    pub windows: Vec<OutputWindow>,
    pub flushes: FlushReport,
}

pub struct TurnDelivery<'s> {
    sink: &'s dyn MessageSink,
    windower: Windower,
    show_function_calls: bool,
}

impl<'s> TurnDelivery<'s> {
    pub fn new(
        sink: &'s dyn MessageSink,
        session_id: SessionId,
        reply_to: Option<MessageId>,
        config: WindowerConfig,
    ) -> Self {
        let config = config.fitted_to(sink.max_content_len());
        Self {
            sink,
            windower: Windower::new(session_id, reply_to, config),
            show_function_calls: false,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DeliveryHooks>) -> Self {
        self.windower = self.windower.with_hooks(hooks);
        self
    }

    /// Announces each function call inline in the reply.
    pub fn with_function_calls_shown(mut self, show: bool) -> Self {
        self.show_function_calls = show;
        self
    }

    /// Consumes `events` until the turn completes, then flushes every window
    /// one last time without the continuation marker.
    pub async fn run<S>(mut self, events: S) -> DeliveryReport
    where
        S: Stream<Item = TurnEvent>,
    {
        let mut events = std::pin::pin!(events);
        let mut text = String::new();
        let mut flushes = FlushReport::default();
        let mut summary = None;

        while let Some(event) = events.next().await {
            match event {
                TurnEvent::TextDelta(delta) => text.push_str(&delta),
                TurnEvent::Notice(notice) => push_block(&mut text, &notice),
                TurnEvent::FunctionCall(call) if self.show_function_calls => {
                    push_block(&mut text, &format!("Calling {}({})", call.name, call.arguments));
                }
                TurnEvent::FunctionCall(_) | TurnEvent::FunctionResult { .. } => continue,
                TurnEvent::TurnComplete(done) => {
                    summary = Some(done);
                    break;
                }
            }
            flushes += self.windower.on_buffer_grown(self.sink, &text, false).await;
        }

        flushes += self.windower.on_buffer_grown(self.sink, &text, true).await;
        DeliveryReport {
            summary,
            text,
            windows: self.windower.into_windows(),
            flushes,
        }
    }
}

fn push_block(text: &mut String, block: &str) {
    if !text.trim().is_empty() && !text.ends_with("\n\n") {
        text.push_str(if text.ends_with('\n') { "\n" } else { "\n\n" });
    }
    text.push_str(block);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_separated_by_blank_line() {
        let mut text = String::new();
        push_block(&mut text, "first");
        push_block(&mut text, "second");
        assert_eq!(text, "first\n\nsecond");

        let mut text = "line\n".to_string();
        push_block(&mut text, "next");
        assert_eq!(text, "line\n\nnext");
    }
}
