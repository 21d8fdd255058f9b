//! Body streams for the exchange.
//!
//! # Responsibilities
//! - Inbound body: readable stream that can be drained and replaced with a
//!   replayable in-memory copy
//! - Outbound body: writable stream that is either the real transport sink
//!   or an in-memory capture buffer with length and seek support
//! - Shared buffer handle used by the capture session

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

/// Source of inbound request bytes.
pub trait InboundStream: AsyncRead + Send + Unpin {}
impl<T> InboundStream for T where T: AsyncRead + Send + Unpin {}

/// Destination for outbound response bytes.
pub trait TransportSink: AsyncWrite + Send + Unpin {}
impl<T> TransportSink for T where T: AsyncWrite + Send + Unpin {}

/// In-memory buffer shared between a response channel and a capture session.
///
/// Behaves like a seekable memory stream: writes land at the current
/// position, and readers can inspect the contents without disturbing it.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Cursor<Vec<u8>>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Cursor<Vec<u8>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append bytes at the current position.
    pub fn write_all(&self, bytes: &[u8]) -> std::io::Result<()> {
        std::io::Write::write_all(&mut *self.lock(), bytes)
    }

    /// Total number of buffered bytes.
    pub fn len(&self) -> u64 {
        self.lock().get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current stream position.
    pub fn position(&self) -> u64 {
        self.lock().position()
    }

    /// Read the full contents from the start, restoring the position
    /// afterwards.
    pub fn peek_from_start(&self) -> Vec<u8> {
        let mut cursor = self.lock();
        let saved = cursor.position();
        let mut contents = Vec::new();
        cursor.set_position(0);
        // Reading from an in-memory cursor cannot fail.
        let _ = std::io::Read::read_to_end(&mut *cursor, &mut contents);
        let _ = cursor.seek(SeekFrom::Start(saved));
        contents
    }
}

/// Readable request body: a live stream until drained, then a replayable
/// in-memory copy.
pub enum InboundBody {
    Stream(Box<dyn InboundStream>),
    Buffered(Cursor<Vec<u8>>),
}

impl InboundBody {
    pub fn empty() -> Self {
        InboundBody::Buffered(Cursor::new(Vec::new()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        InboundBody::Buffered(Cursor::new(bytes))
    }

    pub fn from_stream(stream: Box<dyn InboundStream>) -> Self {
        InboundBody::Stream(stream)
    }

    /// Drain the stream into memory, install the buffered copy in its place
    /// (positioned at the start so later readers see the full body), and
    /// return the contents.
    pub async fn buffer(&mut self) -> std::io::Result<Vec<u8>> {
        match self {
            InboundBody::Stream(stream) => {
                let mut contents = Vec::new();
                stream.read_to_end(&mut contents).await?;
                *self = InboundBody::Buffered(Cursor::new(contents.clone()));
                Ok(contents)
            }
            InboundBody::Buffered(cursor) => Ok(cursor.get_ref().clone()),
        }
    }
}

impl AsyncRead for InboundBody {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            InboundBody::Stream(stream) => Pin::new(stream).poll_read(cx, buf),
            InboundBody::Buffered(cursor) => {
                let n = Read::read(cursor, buf.initialize_unfilled())?;
                buf.advance(n);
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl std::fmt::Debug for InboundBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InboundBody::Stream(_) => f.write_str("InboundBody::Stream"),
            InboundBody::Buffered(cursor) => f
                .debug_struct("InboundBody::Buffered")
                .field("len", &cursor.get_ref().len())
                .finish(),
        }
    }
}

/// Writable response body: the real transport sink, or the capture buffer
/// while a capture session is active.
pub enum OutboundBody {
    Transport {
        sink: Box<dyn TransportSink>,
        written: u64,
    },
    Captured(SharedBuffer),
}

impl OutboundBody {
    pub fn transport(sink: Box<dyn TransportSink>) -> Self {
        OutboundBody::Transport { sink, written: 0 }
    }

    /// Number of body bytes visible so far.
    pub fn len(&self) -> u64 {
        match self {
            OutboundBody::Transport { written, .. } => *written,
            OutboundBody::Captured(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            OutboundBody::Transport { sink, written } => {
                sink.write_all(bytes).await?;
                *written += bytes.len() as u64;
                Ok(())
            }
            OutboundBody::Captured(buffer) => buffer.write_all(bytes),
        }
    }

    /// Buffered contents while captured; `None` once the body is streaming
    /// straight to the transport.
    pub fn peek(&self) -> Option<Vec<u8>> {
        match self {
            OutboundBody::Transport { .. } => None,
            OutboundBody::Captured(buffer) => Some(buffer.peek_from_start()),
        }
    }
}

impl std::fmt::Debug for OutboundBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboundBody::Transport { written, .. } => f
                .debug_struct("OutboundBody::Transport")
                .field("written", written)
                .finish(),
            OutboundBody::Captured(buffer) => f
                .debug_struct("OutboundBody::Captured")
                .field("len", &buffer.len())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_buffer_peek_restores_position() {
        let buffer = SharedBuffer::new();
        buffer.write_all(b"hello world").unwrap();
        let pos = buffer.position();
        assert_eq!(buffer.peek_from_start(), b"hello world");
        assert_eq!(buffer.position(), pos);
    }

    #[tokio::test]
    async fn inbound_body_buffers_and_replays() {
        let mut body = InboundBody::from_stream(Box::new(std::io::Cursor::new(
            b"payload".to_vec(),
        )));
        let first = body.buffer().await.unwrap();
        assert_eq!(first, b"payload");

        // Later readers see the same bytes from the start.
        let mut replay = Vec::new();
        body.read_to_end(&mut replay).await.unwrap();
        assert_eq!(replay, b"payload");
    }

    #[tokio::test]
    async fn outbound_transport_counts_written_bytes() {
        let mut body = OutboundBody::transport(Box::new(Vec::<u8>::new()));
        body.write_all(b"0123456789").await.unwrap();
        assert_eq!(body.len(), 10);
        assert!(body.peek().is_none());
    }
}
