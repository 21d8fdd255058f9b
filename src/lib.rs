//! HTTP pipeline instrumentation library.
//!
//! Sits between the stages of an HTTP server's middleware chain and logs
//! what each stage changed: an incoming-request banner at the first
//! instrumentation point, then a structural diff of headers, status, body
//! length, and principal at every further point, inbound and outbound.
//!
//! # Architecture Overview
//!
//! ```text
//!  Exchange ──▶ point A ──▶ stage 1 ──▶ point B ──▶ stage 2 ──▶ handler
//!                 │pre        │            │pre                    │
//!                 │ banner    │ mutates    │ diff vs. previous     │ writes
//!                 │ + capture │ exchange   │ snapshot              │ body
//!                 │◀──────────┴────────────┴───────────────────────┘
//!                 │post: diff, release capture, forward body once
//! ```
//!
//! The response body is intercepted into a shared buffer for the whole
//! window between the first pre-hook and the last post-hook, so every nested
//! point can inspect it while the transport still receives the bytes exactly
//! once.

// Core subsystems
pub mod capture;
pub mod exchange;
pub mod pipeline;
pub mod snapshot;

// Rendering
pub mod format;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::{LoggerConfig, RenderConfig};
pub use exchange::{Exchange, ExchangeBuilder, Identity, Principal};
pub use observability::{LogSink, TracingSink};
pub use pipeline::{
    from_fn, BoxError, Next, Pipeline, PipelineBuilder, PipelineError, Stage, StageDescription,
    StageResult,
};
