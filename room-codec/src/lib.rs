//! Content buffering and the streaming framing codec for the Room protocol.
//!
//! `room-wire` defines the tokens; this crate defines how they're read from
//! and written to a byte stream, one field at a time, independent of how the
//! underlying transport happens to chunk its reads.

mod codec;
mod content;
mod error;
mod transport;

pub use codec::{RoomMessage, StreamCodec, StreamOptions, StreamReader, StreamWriter};
pub use content::{ContentBuffer, DEFAULT_MAX_FAST_BUFFERING};
pub use error::{RoomError, TransportError, UseError};
pub use transport::{SplitTransport, Transport, TransportRead, TransportWrite};
