//! Response body capture subsystem.
//!
//! # Data Flow
//! ```text
//! first pre-hook        → acquire: swap transport sink for buffer, 1 holder
//! nested pre-hooks      → acquire: +1 holder, buffer stays installed
//! stage writes body     → land in the buffer, inspectable via peek
//! post-hooks            → release: -1 holder
//! final release         → reinstate sink, forward buffered bytes once
//! ```

pub mod body_capture;

pub use body_capture::{BodyCapture, CaptureLease};
