//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! state machine renders an entry
//!     → logging.rs (LogSink trait)
//!     → TracingSink (production) or a collecting sink (tests)
//! ```

pub mod logging;

pub use logging::{init_tracing, LogSink, TracingSink};
