use crate::error::TransportError;

/// The read side of a byte stream: the contract a `StreamReader` needs.
/// Connection establishment (dialing, accepting, the WebSocket handshake)
/// happens before a `TransportRead` exists; this trait only covers an
/// already-connected stream's read/liveness behavior.
pub trait TransportRead: Send {
    /// Read at least one byte into `buf`, returning the number of bytes
    /// read, or `0` on a clean end-of-stream.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Whether the transport still believes the connection is usable. A
    /// transport that has observed a close frame, a reset, or an EOF on
    /// read returns `false` from then on.
    fn is_alive(&self) -> bool;
}

/// The write side of a byte stream: the contract a `StreamWriter` needs.
pub trait TransportWrite: Send {
    /// Write as much of `buf` as one underlying write call accepts,
    /// returning the number of bytes written. `0` signals the transport is
    /// closed; the caller retries until the whole slice is consumed.
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;
}

/// The minimal surface a byte stream must offer for a single, unsplit
/// `StreamCodec` to run over it: a stream with exactly one reader and one
/// writer active at a time, e.g. a test doing a one-shot encode then
/// decode. Concrete adapters (TCP, WebSocket, in-memory) live in
/// `room-transport`.
///
/// `StreamCodec` is generic over this trait rather than dispatching
/// through an enum: a stream has exactly one backend for its whole life,
/// so there's nothing to switch between at runtime.
pub trait Transport: TransportRead + TransportWrite {}

impl<T: TransportRead + TransportWrite> Transport for T {}

/// A transport whose read and write directions can be handed to
/// independent tasks, so a listen loop and a transmit loop never contend
/// for the same guard — per §5: "one reader and one writer may run
/// concurrently … they touch disjoint staging buffers." Every adapter in
/// `room-transport` implements this.
pub trait SplitTransport: Send {
    type Reader: TransportRead + 'static;
    type Writer: TransportWrite + 'static;

    /// Consume the transport, handing its two directions to independent
    /// owners. Each half keeps its own liveness bookkeeping from then on.
    fn split(self) -> (Self::Reader, Self::Writer);
}
