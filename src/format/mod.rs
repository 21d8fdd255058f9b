//! Content formatting subsystem: pure input → text rendering.
//!
//! # Data Flow
//! ```text
//! state machine composes a log entry
//!     → value.rs (single values, banners, header blocks, principals)
//!     → body.rs (bodies by declared content type, response-body peek)
//!     → one rendered String handed to the log sink
//! ```
//!
//! # Design Decisions
//! - No state: every function is input → String
//! - Rendering never fails; parse errors fall back to rawer forms

pub mod body;
pub mod value;

pub use body::{format_body, render_response_body};
pub use value::{
    banner, format_principal, format_value, format_value_list, header_block, header_entries,
    pairs_block,
};
