//! Concrete `room_codec::Transport` adapters over already-connected
//! streams. Dialing, accepting, and the WebSocket handshake happen before
//! any of these types exist — that stays the caller's job.

mod io;
mod websocket;

pub use io::{IoReadHalf, IoTransport, IoWriteHalf, MemTransport, TcpTransport};
pub use websocket::{WebSocketTransport, WsReadHalf, WsWriteHalf};
