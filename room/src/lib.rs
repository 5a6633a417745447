#![doc = include_str!("../README.md")]

//! Thin facade over the split `room-*` crates, mirroring how this
//! codebase exposes a single-name facade (`rapace`) over its own split
//! internals.

#[doc(hidden)]
pub extern crate room_wire;
#[doc(hidden)]
pub extern crate room_codec;
#[doc(hidden)]
pub extern crate room_transport;
#[doc(hidden)]
pub extern crate room_service;
#[doc(hidden)]
pub extern crate tracing;

pub use room_wire::{
    Channel, Count, FrameError, Message, Verb, DEFAULT_MAX_CHANNEL_LENGTH,
    DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_COUNT_LENGTH, DEFAULT_MAX_VERB_LENGTH,
};

pub use room_codec::{
    ContentBuffer, RoomError, RoomMessage, SplitTransport, StreamCodec, StreamOptions, StreamReader,
    StreamWriter, Transport, TransportError, TransportRead, TransportWrite, UseError,
    DEFAULT_MAX_FAST_BUFFERING,
};

pub use room_transport::{
    IoReadHalf, IoTransport, IoWriteHalf, MemTransport, TcpTransport, WebSocketTransport, WsReadHalf,
    WsWriteHalf,
};

pub use room_service::{
    silent_logger, BoxFuture, FnReceiveHandler, Logger, OutboundQueue, ReceiveHandler,
    RoomService, ServiceOptions, StreamId,
};

/// Convenient imports for the common case: building a service over one of
/// the bundled `Transport` adapters.
pub mod prelude {
    pub use crate::{
        Channel, Count, ContentBuffer, FnReceiveHandler, Message, OutboundQueue, ReceiveHandler,
        RoomError, RoomMessage, RoomService, ServiceOptions, StreamCodec, StreamId,
        StreamOptions, Transport, Verb,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    struct Echo;

    impl ReceiveHandler for Echo {
        fn on_receive<'a>(
            &'a self,
            stream_id: StreamId,
            message: RoomMessage,
            outbox: OutboundQueue,
        ) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                let _ = outbox.enqueue(stream_id, message);
            })
        }
    }

    #[tokio::test]
    async fn facade_reexports_compose_into_a_working_service() {
        let (a, b) = room_testkit::mem_pair(4096);
        let codec_a = StreamCodec::new(a, StreamOptions::default());
        let mut codec_b = StreamCodec::new(b, StreamOptions::default());

        let service = RoomService::new(ServiceOptions::default(), Arc::new(Echo));
        service.start().await.unwrap();
        let stream_id = service.add_stream(codec_a).await.unwrap();

        let mut outbound = Message::new(
            Verb::try_parse(b"PING", 128).unwrap(),
            Channel::from_i64(-1),
            ContentBuffer::from_bytes(b"hi".to_vec()),
        );
        codec_b.write_message(&mut outbound).await.unwrap();

        let echoed = codec_b.read_message().await.unwrap();
        assert_eq!(echoed.verb.as_str(), "PING");
        assert_eq!(echoed.channel.to_i64(), Some(-1));

        let _ = stream_id;
        service.dispose().await;
    }
}
