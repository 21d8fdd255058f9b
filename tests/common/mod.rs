//! Shared utilities for integration testing.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use pipeline_logger::LogSink;
use tokio::io::AsyncWrite;

/// Sink collecting every emitted entry so tests can assert on log output.
#[derive(Clone, Default)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<(u64, String)>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn scopes(&self) -> Vec<u64> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(scope, _)| *scope)
            .collect()
    }

    /// Entries containing the given needle.
    pub fn matching(&self, needle: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.contains(needle))
            .collect()
    }
}

impl LogSink for CollectingSink {
    fn emit(&self, scope: u64, _server: &str, text: &str) {
        self.entries.lock().unwrap().push((scope, text.to_string()));
    }
}

/// Transport sink the test can read back after the exchange owns it.
#[derive(Clone, Default)]
pub struct SharedTransport {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().unwrap().clone()
    }
}

impl AsyncWrite for SharedTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
