//! Turn lifecycle hooks.
//!
//! Every method has a no-op default; implementations pick the events they
//! care about.

use std::time::Duration;

use pcommon::SessionId;
use pprovider::{FunctionCall, ProviderError};
use ptooling::ToolError;

use crate::{BudgetCheck, TurnSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    BudgetCheck,
    Streaming,
    FunctionDispatch,
    Completing,
}

impl TurnPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BudgetCheck => "budget_check",
            Self::Streaming => "streaming",
            Self::FunctionDispatch => "function_dispatch",
            Self::Completing => "completing",
        }
    }
}

pub trait TurnHooks: Send + Sync {
    fn on_turn_start(&self, _session: &SessionId, _model: &str) {}

    fn on_phase(&self, _session: &SessionId, _phase: TurnPhase) {}

    fn on_budget_checked(&self, _session: &SessionId, _check: &BudgetCheck) {}

    fn on_backend_call(&self, _session: &SessionId, _attempt: u32) {}

    fn on_rate_limited(
        &self,
        _session: &SessionId,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_backend_error(&self, _session: &SessionId, _error: &ProviderError) {}

    fn on_function_dispatch(&self, _session: &SessionId, _call: &FunctionCall) {}

    fn on_duplicate_call(&self, _session: &SessionId, _call: &FunctionCall) {}

    fn on_function_failed(&self, _session: &SessionId, _call: &FunctionCall, _error: &ToolError) {}

    fn on_round_limit(&self, _session: &SessionId, _limit: u32) {}

    fn on_turn_complete(&self, _summary: &TurnSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnHooks;

impl TurnHooks for NoopTurnHooks {}
