//! Pipeline instrumentation subsystem.
//!
//! # Data Flow
//! ```text
//! PipelineBuilder (stages + instrumentation points, in chain order)
//!     → Pipeline::dispatch (one Exchange per request)
//!     → InstrumentationPoint pre-hook  → LoggingService → state.rs
//!     → nested stages run, mutating the exchange
//!     → InstrumentationPoint post-hook → LoggingService → state.rs
//!     → rendered entries emitted through the LogSink
//! ```
//!
//! # Design Decisions
//! - Every instrumentation point brackets the rest of the chain, so the
//!   reference-counted body capture survives from the first pre-hook to the
//!   last post-hook while each point reports only its neighbor's delta
//! - Stage errors pass through unchanged; hook bookkeeping always runs first

pub mod middleware;
pub mod service;
pub mod state;

use thiserror::Error;

pub use middleware::{
    from_fn, FromFn, Next, Pipeline, PipelineBuilder, Stage, StageDescription,
};
pub use service::LoggingService;
pub use state::LoggingState;

/// Error type observed stages return; the pipeline never inspects it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of running a stage or dispatching the pipeline.
pub type StageResult = Result<(), BoxError>;

/// Errors raised by the instrumentation pipeline itself.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A post-hook fired while no pre-hook had been observed; the
    /// surrounding instrumentation contract is broken.
    #[error("post-invoke hook observed before any pre-invoke hook")]
    HookImbalance,

    /// The exchange was dispatched without a logging service attached.
    #[error("logging service missing from exchange extensions")]
    MissingService,

    /// The inbound body stream could not be buffered.
    #[error("failed to buffer request body: {0}")]
    RequestBody(#[source] std::io::Error),

    /// Forwarding the captured body to the transport failed; the transport
    /// stream was reinstated before the copy, so the response remains
    /// deliverable.
    #[error("failed to forward captured response body: {0}")]
    BodyRestore(#[source] std::io::Error),
}
