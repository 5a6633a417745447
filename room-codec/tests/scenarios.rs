//! Literal end-to-end scenarios from §8: concrete byte sequences with
//! known-correct decodes, rather than property-generated ones.

use room_codec::{ContentBuffer, StreamCodec, StreamOptions};
use room_testkit::{ChunkedTransport, WriteCapture};
use room_wire::{Channel, Message, Verb};

#[tokio::test]
async fn smallest_valid_message_roundtrips_byte_identical() {
    let transport = ChunkedTransport::chunked(b"A +0 0 ", 0);
    let mut codec = StreamCodec::new(transport, StreamOptions::default());
    let mut message = codec.read_message().await.unwrap();
    assert_eq!(message.verb.as_str(), "A");
    assert_eq!(message.channel.to_i64(), Some(0));
    assert_eq!(message.content.read_to_vec().await.unwrap(), b"");

    let mut writer = StreamCodec::new(WriteCapture::new(), StreamOptions::default());
    writer.write_message(&mut message).await.unwrap();
    assert_eq!(writer.transport().written, b"A +0 0 ");
}

#[tokio::test]
async fn hex_channel_with_content_roundtrips_byte_identical() {
    let transport = ChunkedTransport::chunked(b"MSG +ff 5 hello", 0);
    let mut codec = StreamCodec::new(transport, StreamOptions::default());
    let mut message = codec.read_message().await.unwrap();
    assert_eq!(message.verb.as_str(), "MSG");
    assert_eq!(message.channel.to_i64(), Some(255));
    assert_eq!(message.content.read_to_vec().await.unwrap(), b"hello");

    let mut writer = StreamCodec::new(WriteCapture::new(), StreamOptions::default());
    writer.write_message(&mut message).await.unwrap();
    assert_eq!(writer.transport().written, b"MSG +ff 5 hello");
}

#[tokio::test]
async fn negative_channel_decodes_to_broadcast_value() {
    let transport = ChunkedTransport::chunked(b"BCAST -1 4 ABCD", 0);
    let mut codec = StreamCodec::new(transport, StreamOptions::default());
    let message = codec.read_message().await.unwrap();
    assert_eq!(message.verb.as_str(), "BCAST");
    assert_eq!(message.channel.to_i64(), Some(-1));
}

#[tokio::test]
async fn broadcast_echo_over_loopback_pair() {
    let (a, b) = room_testkit::mem_pair(4096);
    let mut sender = StreamCodec::new(a, StreamOptions::default());
    let mut receiver = StreamCodec::new(b, StreamOptions::default());

    let mut outbound = Message::new(
        Verb::try_parse(b"PING", 128).unwrap(),
        Channel::from_i64(-1),
        ContentBuffer::from_bytes(Vec::new()),
    );
    sender.write_message(&mut outbound).await.unwrap();
    let inbound = receiver.read_message().await.unwrap();

    assert_eq!(inbound.verb.as_str(), "PING");
    assert_eq!(inbound.channel.to_i64(), Some(-1));
    assert!(inbound.content.is_empty());
}

#[tokio::test]
async fn oversize_verb_rejected_before_reading_past_it() {
    let mut options = StreamOptions::default();
    options.max_verb_length = 128;
    let long_verb = vec![b'A'; 129];
    let mut wire = long_verb;
    wire.push(b' ');
    wire.extend_from_slice(b"+0 0 ");

    let transport = ChunkedTransport::chunked(&wire, 0);
    let mut codec = StreamCodec::new(transport, options);
    let err = codec.read_message().await.unwrap_err();
    assert!(matches!(
        err,
        room_codec::RoomError::Frame(room_wire::FrameError::VerbTooLarge { max: 128 })
    ));
}

#[tokio::test]
async fn content_above_fast_buffering_threshold_spills_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = StreamOptions::default();
    options.max_fast_buffering = 1_048_576;
    options.max_content_length = 2 * 1_048_576;
    options.temp_content_folder = dir.path().to_path_buf();

    let payload = vec![0x55u8; 1_048_577];
    let mut wire = format!("DATA +1 {}\x20", payload.len()).into_bytes();
    wire.extend_from_slice(&payload);

    let transport = ChunkedTransport::chunked(&wire, 64 * 1024);
    let mut codec = StreamCodec::new(transport, options);
    let mut message = codec.read_message().await.unwrap();

    assert!(matches!(message.content, ContentBuffer::TempFile { .. }));
    let path = message.content.path().unwrap().to_path_buf();
    assert!(path.starts_with(dir.path()));

    let bytes = message.content.read_to_vec().await.unwrap();
    assert_eq!(bytes, payload);

    drop(message);
    assert!(!path.exists());
}
