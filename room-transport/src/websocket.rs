//! `Transport` over an already-established WebSocket stream, per §4.5: text
//! frames are rejected with a close carrying `CloseCode::Invalid`, an
//! incoming close frame maps to a graceful 0-byte read, and every write
//! goes out as a single binary frame.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use room_codec::{SplitTransport, TransportError, TransportRead, TransportWrite};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

pub struct WebSocketTransport<S> {
    ws: WebSocketStream<S>,
    pending: Vec<u8>,
    pending_pos: usize,
    alive: bool,
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-established WebSocket connection (handshake already
    /// completed by the caller).
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self {
            ws,
            pending: Vec::new(),
            pending_pos: 0,
            alive: true,
        }
    }

    async fn reject_text_frame(&mut self) {
        tracing::warn!("rejecting text-typed WebSocket frame, closing");
        let _ = self
            .ws
            .send(WsMessage::Close(Some(CloseFrame {
                code: CloseCode::Invalid,
                reason: "text frames are not accepted".into(),
            })))
            .await;
        self.alive = false;
    }
}

impl<S> TransportRead for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        if self.pending_pos >= self.pending.len() {
            loop {
                match self.ws.next().await {
                    None => {
                        self.alive = false;
                        return Ok(0);
                    }
                    Some(Err(_)) => {
                        self.alive = false;
                        return Err(TransportError::Closed);
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        self.pending = data.to_vec();
                        self.pending_pos = 0;
                        break;
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        tracing::debug!("peer sent a close frame, ending the stream gracefully");
                        self.alive = false;
                        return Ok(0);
                    }
                    Some(Ok(WsMessage::Text(_))) => {
                        self.reject_text_frame().await;
                        return Ok(0);
                    }
                    // Ping/Pong are answered automatically by tungstenite;
                    // raw frames never surface through a client stream.
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                        continue;
                    }
                }
            }
        }
        let available = &self.pending[self.pending_pos..];
        let n = std::cmp::min(available.len(), buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

impl<S> TransportWrite for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        self.ws
            .send(WsMessage::Binary(buf.to_vec().into()))
            .await
            .map_err(|_| TransportError::Closed)?;
        Ok(buf.len())
    }
}

/// The read half of a `WebSocketTransport` split by
/// [`SplitTransport::split`]. Unlike the unsplit transport, a rejected
/// text frame can't send its own close frame back (the sink lives on the
/// writer half now) — it just ends the stream.
pub struct WsReadHalf<S> {
    stream: SplitStream<WebSocketStream<S>>,
    pending: Vec<u8>,
    pending_pos: usize,
    alive: bool,
}

impl<S> TransportRead for WsReadHalf<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.alive {
            return Ok(0);
        }
        if self.pending_pos >= self.pending.len() {
            loop {
                match self.stream.next().await {
                    None => {
                        self.alive = false;
                        return Ok(0);
                    }
                    Some(Err(_)) => {
                        self.alive = false;
                        return Err(TransportError::Closed);
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        self.pending = data.to_vec();
                        self.pending_pos = 0;
                        break;
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        tracing::debug!("peer sent a close frame, ending the stream gracefully");
                        self.alive = false;
                        return Ok(0);
                    }
                    Some(Ok(WsMessage::Text(_))) => {
                        tracing::warn!("rejecting text-typed WebSocket frame, closing");
                        self.alive = false;
                        return Ok(0);
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                        continue;
                    }
                }
            }
        }
        let available = &self.pending[self.pending_pos..];
        let n = std::cmp::min(available.len(), buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_pos += n;
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}

/// The write half of a `WebSocketTransport` split by
/// [`SplitTransport::split`].
pub struct WsWriteHalf<S> {
    sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

impl<S> TransportWrite for WsWriteHalf<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.sink
            .send(WsMessage::Binary(buf.to_vec().into()))
            .await
            .map_err(|_| TransportError::Closed)?;
        Ok(buf.len())
    }
}

impl<S> SplitTransport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Reader = WsReadHalf<S>;
    type Writer = WsWriteHalf<S>;

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (sink, stream) = self.ws.split();
        (
            WsReadHalf {
                stream,
                pending: self.pending,
                pending_pos: self.pending_pos,
                alive: self.alive,
            },
            WsWriteHalf { sink },
        )
    }
}
