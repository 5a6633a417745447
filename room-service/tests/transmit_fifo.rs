//! §8.6 FIFO preservation: messages enqueued in order `(s, m1), (s, m2)`
//! are written to `s` in that order, even when enqueued from different
//! producers.

use std::sync::Arc;

use room_codec::{ContentBuffer, RoomMessage, StreamCodec, StreamOptions};
use room_service::{BoxFuture, OutboundQueue, ReceiveHandler, RoomService, ServiceOptions, StreamId};
use room_wire::{Channel, Message, Verb};

struct NoopHandler;

impl ReceiveHandler for NoopHandler {
    fn on_receive<'a>(&'a self, _stream_id: StreamId, _message: RoomMessage, _outbox: OutboundQueue) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

fn message(verb: &str, channel: i64, content: &[u8]) -> RoomMessage {
    Message::new(
        Verb::try_parse(verb.as_bytes(), 128).unwrap(),
        Channel::from_i64(channel),
        ContentBuffer::from_bytes(content.to_vec()),
    )
}

#[tokio_test_lite::test]
async fn messages_drain_in_enqueue_order() {
    let (inside, outside) = room_testkit::mem_pair(64 * 1024);
    let codec = StreamCodec::new(inside, StreamOptions::default());
    let mut reader = StreamCodec::new(outside, StreamOptions::default());

    let service = RoomService::new(ServiceOptions::default(), Arc::new(NoopHandler));
    service.start().await.unwrap();
    let stream_id = service.add_stream(codec).await.unwrap();

    service.enqueue(stream_id, message("A", 1, b"one")).unwrap();
    service.enqueue(stream_id, message("B", 2, b"two")).unwrap();
    service.enqueue(stream_id, message("C", 3, b"three")).unwrap();

    let m1 = reader.read_message().await.unwrap();
    let m2 = reader.read_message().await.unwrap();
    let m3 = reader.read_message().await.unwrap();

    assert_eq!(m1.verb.as_str(), "A");
    assert_eq!(m2.verb.as_str(), "B");
    assert_eq!(m3.verb.as_str(), "C");

    service.dispose().await;
}

#[tokio_test_lite::test]
async fn interleaved_producers_still_observe_strict_fifo() {
    let (inside, outside) = room_testkit::mem_pair(64 * 1024);
    let codec = StreamCodec::new(inside, StreamOptions::default());
    let mut reader = StreamCodec::new(outside, StreamOptions::default());

    let service = RoomService::new(ServiceOptions::default(), Arc::new(NoopHandler));
    service.start().await.unwrap();
    let stream_id = service.add_stream(codec).await.unwrap();
    let outbox_a = service.outbox();
    let outbox_b = service.outbox();

    outbox_a.enqueue(stream_id, message("FIRST", 1, b"a")).unwrap();
    outbox_b.enqueue(stream_id, message("SECOND", 1, b"b")).unwrap();
    outbox_a.enqueue(stream_id, message("THIRD", 1, b"c")).unwrap();

    let m1 = reader.read_message().await.unwrap();
    let m2 = reader.read_message().await.unwrap();
    let m3 = reader.read_message().await.unwrap();

    assert_eq!(m1.verb.as_str(), "FIRST");
    assert_eq!(m2.verb.as_str(), "SECOND");
    assert_eq!(m3.verb.as_str(), "THIRD");

    service.dispose().await;
}
