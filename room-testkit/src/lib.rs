//! Test-only `Transport` implementations shared across the Room crates:
//! one that serves a byte stream split into caller-chosen chunks (for
//! chunk-independence tests), one that just captures what gets written,
//! and a connected in-memory pair for end-to-end service tests.

use std::collections::VecDeque;

use room_codec::{TransportError, TransportRead, TransportWrite};

/// A read-only `Transport` that serves a pre-built byte stream one
/// caller-chosen chunk per `read` call, regardless of the caller's buffer
/// size — for exercising the claim that decoding doesn't depend on how
/// the bytes happened to arrive.
pub struct ChunkedTransport {
    chunks: VecDeque<Vec<u8>>,
    alive: bool,
}

impl ChunkedTransport {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            alive: true,
        }
    }

    /// Split `data` into chunks of at most `chunk_size` bytes. A
    /// `chunk_size` of 0 yields a single chunk holding the whole stream.
    pub fn chunked(data: &[u8], chunk_size: usize) -> Self {
        if chunk_size == 0 || data.is_empty() {
            return Self::new(vec![data.to_vec()]);
        }
        Self::new(data.chunks(chunk_size).map(|c| c.to_vec()).collect())
    }
}

impl TransportRead for ChunkedTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.chunks.pop_front() {
            None => {
                self.alive = false;
                Ok(0)
            }
            Some(chunk) => {
                let n = std::cmp::min(chunk.len(), buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    self.chunks.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl TransportWrite for ChunkedTransport {
    async fn write(&mut self, _buf: &[u8]) -> Result<usize, TransportError> {
        Err(TransportError::Closed)
    }
}

/// A write-only `Transport` that accumulates everything written to it, for
/// asserting on the serialized byte stream.
#[derive(Default)]
pub struct WriteCapture {
    pub written: Vec<u8>,
}

impl WriteCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransportRead for WriteCapture {
    async fn read(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(0)
    }

    fn is_alive(&self) -> bool {
        true
    }
}

impl TransportWrite for WriteCapture {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// A connected pair of in-memory transports, for service-level and
/// end-to-end tests that need a real duplex link rather than separate
/// read/write stubs.
pub fn mem_pair(buffer_size: usize) -> (room_transport::MemTransport, room_transport::MemTransport) {
    room_transport::MemTransport::pair(buffer_size)
}
