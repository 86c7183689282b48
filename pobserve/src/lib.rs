//! Observability hooks for backend attempts, function calls, turns and delivery.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::TurnHooks;
//! use pobserve::{CompositeHooks, MetricsObservabilityHooks, SafeTurnHooks, TracingObservabilityHooks};
//!
//! let hooks: Arc<dyn TurnHooks> = Arc::new(SafeTurnHooks::new(CompositeHooks::new(
//!     TracingObservabilityHooks,
//!     MetricsObservabilityHooks,
//! )));
//! # let _ = hooks;
//! ```

mod composite;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use composite::CompositeHooks;
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeDeliveryHooks, SafeProviderHooks, SafeToolHooks, SafeTurnHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        CompositeHooks, MetricsObservabilityHooks, SafeDeliveryHooks, SafeProviderHooks,
        SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
