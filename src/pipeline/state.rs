//! Per-request logging state.

use crate::snapshot::ExchangeSnapshot;

/// Where a request is in its logging lifecycle. Exactly one value is live
/// per request; hooks replace it with the next state.
#[derive(Debug)]
pub enum LoggingState {
    /// No hook has fired yet.
    Initial,
    /// At least one pre-hook has fired; carries the most recent snapshot so
    /// each hook reports only the delta introduced by its immediate neighbor.
    Observing { snapshot: ExchangeSnapshot },
    /// Absorbing teardown state; all hooks are no-ops.
    Terminal,
}
