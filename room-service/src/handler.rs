use std::future::Future;
use std::pin::Pin;

use room_codec::RoomMessage;

use crate::service::{OutboundQueue, StreamId};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Invoked by a listen loop for every message successfully read off its
/// stream. Takes the queue by value (cheap: it's a channel handle) so a
/// handler can re-enqueue the same message's content for outbound
/// transmission — the common routing case — without this crate tracking
/// whether the content is "still referenced" the way the source design
/// does; Rust's ownership already answers that question.
pub trait ReceiveHandler: Send + Sync {
    fn on_receive<'a>(
        &'a self,
        stream_id: StreamId,
        message: RoomMessage,
        outbox: OutboundQueue,
    ) -> BoxFuture<'a, ()>;
}

/// Adapts a plain async closure into a `ReceiveHandler`.
pub struct FnReceiveHandler<F>(F);

impl<F> FnReceiveHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> ReceiveHandler for FnReceiveHandler<F>
where
    F: Fn(StreamId, RoomMessage, OutboundQueue) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn on_receive<'a>(
        &'a self,
        stream_id: StreamId,
        message: RoomMessage,
        outbox: OutboundQueue,
    ) -> BoxFuture<'a, ()> {
        Box::pin((self.0)(stream_id, message, outbox))
    }
}

/// A raw `Fn(&str)` logging sink, offered for parity with the source
/// design's injected-logger hook. Most callers should prefer the
/// `tracing` events this crate emits at the same call sites; this exists
/// for code that wants a single textual log without wiring a subscriber.
pub type Logger = std::sync::Arc<dyn Fn(&str) + Send + Sync>;

pub fn silent_logger() -> Logger {
    std::sync::Arc::new(|_: &str| {})
}
