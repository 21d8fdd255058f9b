//! Reference-counted interception of the response body stream.
//!
//! # Responsibilities
//! - Swap the response's outbound stream for an in-memory buffer on first
//!   acquire, retaining the real transport sink
//! - Count nested holders; only the release that brings the count to zero
//!   restores the transport and forwards the buffered bytes
//! - Let holders inspect the buffered body without disturbing it
//!
//! # Design Decisions
//! - Acquire hands out a linear `CaptureLease` instead of relying on
//!   manually paired increment/decrement calls
//! - Release reinstates the transport sink before copying, so a failed copy
//!   can never leave the response without a deliverable stream

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::exchange::{ResponseChannel, SharedBuffer, TransportSink};

struct CaptureSession {
    buffer: SharedBuffer,
    original: Option<(Box<dyn TransportSink>, u64)>,
    holders: Arc<AtomicUsize>,
}

/// One per-request capture of the response body stream.
#[derive(Default)]
pub struct BodyCapture {
    session: Mutex<Option<CaptureSession>>,
}

impl BodyCapture {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> MutexGuard<'_, Option<CaptureSession>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin or join the capture window.
    ///
    /// The first acquire swaps the response's outbound stream for a buffer
    /// and retains the original sink; nested acquires only add a holder.
    pub fn acquire(&self, response: &mut ResponseChannel) -> CaptureLease {
        let mut session = self.session();
        match session.as_ref() {
            Some(active) => {
                active.holders.fetch_add(1, Ordering::AcqRel);
                CaptureLease::new(active.holders.clone())
            }
            None => {
                let buffer = SharedBuffer::new();
                let original = response.swap_in_buffer(buffer.clone());
                let holders = Arc::new(AtomicUsize::new(1));
                *session = Some(CaptureSession {
                    buffer,
                    original,
                    holders: holders.clone(),
                });
                CaptureLease::new(holders)
            }
        }
    }

    /// Surrender one lease. The final release reinstates the transport sink
    /// and forwards the buffered bytes to it; earlier releases only drop a
    /// holder. Returns whether the capture window closed.
    pub async fn release(
        &self,
        lease: CaptureLease,
        response: &mut ResponseChannel,
    ) -> std::io::Result<bool> {
        if lease.surrender() > 0 {
            return Ok(false);
        }
        let Some(finished) = self.session().take() else {
            return Ok(false);
        };
        let bytes = finished.buffer.peek_from_start();
        if let Some((sink, written)) = finished.original {
            // Reinstate first: a failed copy must not strand the response.
            response.reinstate_transport(sink, written);
            response.write_body(&bytes).await?;
        }
        Ok(true)
    }

    /// Buffered body bytes while the session is active, position preserved.
    pub fn peek_body(&self) -> Option<Vec<u8>> {
        self.session()
            .as_ref()
            .map(|active| active.buffer.peek_from_start())
    }

    pub fn is_active(&self) -> bool {
        self.session().is_some()
    }
}

impl std::fmt::Debug for BodyCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyCapture")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Held by each nested instrumentation point while it is interested in the
/// response body. Must be given back through [`BodyCapture::release`].
pub struct CaptureLease {
    holders: Arc<AtomicUsize>,
    armed: bool,
}

impl CaptureLease {
    fn new(holders: Arc<AtomicUsize>) -> Self {
        Self { holders, armed: true }
    }

    /// Drop a holder, returning how many remain.
    fn surrender(mut self) -> usize {
        self.armed = false;
        self.holders.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

impl Drop for CaptureLease {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("body capture lease dropped without release");
        }
    }
}

impl std::fmt::Debug for CaptureLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLease")
            .field("holders", &self.holders.load(Ordering::Acquire))
            .finish()
    }
}
