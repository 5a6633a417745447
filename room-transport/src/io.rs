//! A `Transport` over any plain `AsyncRead + AsyncWrite` stream. Used
//! directly for TCP and for the in-memory test pair; not suitable for
//! WebSocket, whose frame boundaries don't line up with raw byte reads.

use room_codec::{SplitTransport, TransportError, TransportRead, TransportWrite};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

/// Wraps an already-connected duplex byte stream as a `Transport`. A `0`
/// read or write marks the stream dead for the rest of its life — this
/// mirrors how `TcpStream`/`DuplexStream` report a closed peer.
pub struct IoTransport<S> {
    stream: S,
    alive: bool,
}

impl<S> IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream, alive: true }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> TransportRead for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        let n = self.stream.read(buf).await?;
        if n == 0 {
            tracing::debug!("transport read returned 0, marking dead");
            self.alive = false;
        }
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl<S> TransportWrite for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        let n = self.stream.write(buf).await?;
        if n == 0 {
            tracing::debug!("transport write returned 0, marking dead");
            self.alive = false;
        }
        Ok(n)
    }
}

/// The read half of an `IoTransport` split by [`SplitTransport::split`].
/// Tracks its own liveness — a clean EOF here says nothing about whether
/// the write half can still make progress.
pub struct IoReadHalf<S> {
    stream: ReadHalf<S>,
    alive: bool,
}

impl<S> TransportRead for IoReadHalf<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        let n = self.stream.read(buf).await?;
        if n == 0 {
            tracing::debug!("transport read returned 0, marking dead");
            self.alive = false;
        }
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// The write half of an `IoTransport` split by [`SplitTransport::split`].
pub struct IoWriteHalf<S> {
    stream: WriteHalf<S>,
    alive: bool,
}

impl<S> TransportWrite for IoWriteHalf<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        let n = self.stream.write(buf).await?;
        if n == 0 {
            tracing::debug!("transport write returned 0, marking dead");
            self.alive = false;
        }
        Ok(n)
    }
}

impl<S> SplitTransport for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Reader = IoReadHalf<S>;
    type Writer = IoWriteHalf<S>;

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (read_half, write_half) = io::split(self.stream);
        (
            IoReadHalf {
                stream: read_half,
                alive: self.alive,
            },
            IoWriteHalf {
                stream: write_half,
                alive: self.alive,
            },
        )
    }
}

/// A `Transport` over an already-connected `tokio::net::TcpStream`. Dialing
/// or accepting the connection is the caller's responsibility.
pub type TcpTransport = IoTransport<TcpStream>;

/// A `Transport` over an in-memory duplex pair, for tests and single-process
/// wiring. Connection-less, so there's no establishment step to exclude.
pub type MemTransport = IoTransport<DuplexStream>;

impl MemTransport {
    /// Build a connected pair of in-memory transports. `buffer_size` bounds
    /// how much either side can have in flight before a write blocks.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (a, b) = tokio::io::duplex(buffer_size);
        (IoTransport::new(a), IoTransport::new(b))
    }
}
