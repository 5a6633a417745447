//! Service loop: per-stream listen loops with ingress rate limiting, a
//! shared transmit loop draining a strict-FIFO outbound queue, and the
//! `RoomService` lifecycle (`start`/`stop`/`dispose`) that owns them.
//!
//! Generic over `room_codec::SplitTransport` — every registered stream is
//! split into independent reader and writer halves so the listen loop and
//! the transmit loop never contend for the same lock. This crate never
//! names a concrete transport, only the contract.

mod handler;
mod options;
mod service;

pub use handler::{silent_logger, BoxFuture, FnReceiveHandler, Logger, ReceiveHandler};
pub use options::ServiceOptions;
pub use service::{OutboundQueue, RoomService, StreamId};
