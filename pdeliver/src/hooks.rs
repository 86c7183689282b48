//! Delivery lifecycle hooks.

use pcommon::SessionId;

use crate::SinkError;

pub trait DeliveryHooks: Send + Sync {
    fn on_window_created(&self, _session_id: &SessionId, _index: usize) {}

    fn on_window_edited(&self, _session_id: &SessionId, _index: usize) {}

    /// The rich payload was refused and a plain retry follows.
    fn on_formatting_rejected(&self, _session_id: &SessionId, _index: usize, _error: &SinkError) {}

    /// Both the rich and the plain attempt failed; the window keeps its
    /// previous text.
    fn on_delivery_failed(&self, _session_id: &SessionId, _index: usize, _error: &SinkError) {}

    fn on_flush_throttled(&self, _session_id: &SessionId) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeliveryHooks;

impl DeliveryHooks for NoopDeliveryHooks {}
