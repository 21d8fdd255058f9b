//! The exchange subsystem: the crate's boundary with the hosting framework.
//!
//! # Data Flow
//! ```text
//! hosting adapter builds an Exchange per request
//!     → context.rs (request/response channels, principal, extensions)
//!     → body.rs (inbound stream ⇄ replay buffer, outbound sink ⇄ capture buffer)
//!     → principal.rs (identities and claims, Arc identity)
//!     → stages mutate the exchange; instrumentation snapshots it
//! ```
//!
//! # Design Decisions
//! - The exchange is crate-owned rather than framework-owned: Rust HTTP
//!   frameworks pass requests and responses by value, so observing response
//!   state mid-request requires a context that accrues it
//! - Body streams are trait objects so adapters can plug in any transport

pub mod body;
pub mod context;
pub mod principal;

pub use body::{InboundBody, InboundStream, OutboundBody, SharedBuffer, TransportSink};
pub use context::{Exchange, ExchangeBuilder, RequestChannel, ResponseChannel};
pub use principal::{Claim, Identity, Principal};
