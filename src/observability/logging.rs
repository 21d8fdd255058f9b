//! Structured logging.
//!
//! # Responsibilities
//! - Define the sink seam the state machine emits rendered entries through
//! - Provide the default `tracing`-backed sink
//! - Initialize the tracing subscriber for hosting binaries
//!
//! # Design Decisions
//! - The sink is injected so tests can collect entries; production uses
//!   `tracing` like every other subsystem
//! - Entries carry the server-name label and a scope number grouping the
//!   lines of one request

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Destination for rendered log entries.
pub trait LogSink: Send + Sync {
    /// Emit one multi-line entry. `scope` groups the entries of a single
    /// request; `server` is the configured sink label.
    fn emit(&self, scope: u64, server: &str, text: &str);
}

/// Default sink writing through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, scope: u64, server: &str, text: &str) {
        tracing::info!(server = %server, scope, "{text}");
    }
}

/// Initialize the tracing subscriber with an env-filter default.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline_logger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
