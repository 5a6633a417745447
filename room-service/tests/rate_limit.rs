//! §8.7 Rate-limit soft cap: a listen loop throttles an oversized message
//! with a sleep proportional to how far it exceeded `max_stream_rate`,
//! but never disconnects the stream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use room_codec::{ContentBuffer, RoomMessage, StreamCodec, StreamOptions};
use room_service::{BoxFuture, OutboundQueue, ReceiveHandler, RoomService, ServiceOptions, StreamId};
use room_wire::{Channel, Message, Verb};
use tokio::sync::mpsc;

struct RecordingHandler {
    tx: mpsc::UnboundedSender<Instant>,
    received: Arc<AtomicUsize>,
}

impl ReceiveHandler for RecordingHandler {
    fn on_receive<'a>(&'a self, _stream_id: StreamId, message: RoomMessage, _outbox: OutboundQueue) -> BoxFuture<'a, ()> {
        self.received.fetch_add(message.content.len() as usize, Ordering::SeqCst);
        let _ = self.tx.send(Instant::now());
        Box::pin(async {})
    }
}

fn message_with_len(len: usize) -> RoomMessage {
    Message::new(
        Verb::try_parse(b"DATA", 128).unwrap(),
        Channel::from_i64(1),
        ContentBuffer::from_bytes(vec![0x55; len]),
    )
}

#[tokio_test_lite::test]
async fn oversized_message_is_throttled_not_disconnected() {
    let (inside, outside) = room_testkit::mem_pair(1024 * 1024);
    let codec = StreamCodec::new(inside, StreamOptions::default());
    let mut outbound_codec = StreamCodec::new(outside, StreamOptions::default());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let received = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(RecordingHandler {
        tx,
        received: Arc::clone(&received),
    });

    // A cap small enough that a single 6000-byte message triggers roughly
    // a 1.2s sleep before the handler sees it, but large enough the test
    // doesn't hinge on scheduler jitter at the millisecond scale.
    let options = ServiceOptions { max_stream_rate: 5_000 };
    let service = RoomService::new(options, handler);
    service.start().await.unwrap();
    let _stream_id = service.add_stream(codec).await.unwrap();

    let started = Instant::now();
    let mut msg = message_with_len(6_000);
    outbound_codec.write_message(&mut msg).await.unwrap();

    let received_at = rx.recv().await.expect("handler should still receive the message");
    let elapsed = received_at.duration_since(started);

    // Soft cap: the stream is throttled (a visible delay), not rejected.
    assert!(
        elapsed.as_millis() >= 900,
        "expected a throttling delay of roughly 1.2s, got {elapsed:?}"
    );
    assert!(
        elapsed.as_millis() <= 3_000,
        "throttling delay grew unexpectedly large: {elapsed:?}"
    );
    assert_eq!(received.load(Ordering::SeqCst), 6_000);

    service.dispose().await;
}
