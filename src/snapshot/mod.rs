//! Snapshot subsystem: immutable captures of an exchange and the structural
//! diff between consecutive captures.
//!
//! # Data Flow
//! ```text
//! pre/post hook fires
//!     → snapshot.rs (take: copy method, path, headers, cookies,
//!       status, body length, principal)
//!     → diff.rs (compare against the previous snapshot)
//!     → non-empty difference rendered and emitted by the state machine
//! ```

pub mod diff;
pub mod snapshot;

pub use diff::{
    compare, ExchangeDifference, HeaderDifference, MapDifference, RequestDifference,
    ResponseDifference, ValueChange,
};
pub use snapshot::{take, ExchangeSnapshot, RequestSnapshot, ResponseSnapshot};
