//! The streaming framing codec: reads and writes `Message<ContentBuffer>`
//! over any `Transport`, one field at a time, independent of how the
//! underlying reads happen to chunk the bytes.

use std::path::PathBuf;

use room_wire::{
    scan_class, Channel, Count, FrameError, Message, Verb, DEFAULT_MAX_CHANNEL_LENGTH,
    DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_COUNT_LENGTH, DEFAULT_MAX_VERB_LENGTH,
};

use crate::content::{ContentBuffer, DEFAULT_MAX_FAST_BUFFERING};
use crate::error::{RoomError, TransportError};
use crate::transport::{SplitTransport, Transport, TransportRead, TransportWrite};

/// Tunable knobs for a single `StreamCodec`. Two streams on the same
/// process may run with different options (e.g. a trusted internal link
/// with a larger `max_content_length`).
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    pub max_verb_length: usize,
    pub max_channel_length: usize,
    pub max_count_length: usize,
    pub max_content_length: u64,
    pub max_fast_buffering: u64,
    pub temp_content_folder: PathBuf,
    pub temp_content_prefix: String,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 8 * 1024,
            write_buffer_size: 8 * 1024,
            max_verb_length: DEFAULT_MAX_VERB_LENGTH,
            max_channel_length: DEFAULT_MAX_CHANNEL_LENGTH,
            max_count_length: DEFAULT_MAX_COUNT_LENGTH,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            max_fast_buffering: DEFAULT_MAX_FAST_BUFFERING,
            temp_content_folder: std::env::temp_dir(),
            temp_content_prefix: "room-".to_string(),
        }
    }
}

/// A `Message` whose content lives in a `ContentBuffer`.
pub type RoomMessage = Message<ContentBuffer>;

/// A field's character class, used to pick the scanner and the right
/// `FrameError` variant in the shared field-reading template (§4.3.1).
#[derive(Clone, Copy)]
enum FieldClass {
    Word,
    Channel,
    Digit,
}

impl FieldClass {
    fn scan(self, view: &[u8]) -> usize {
        match self {
            Self::Word => scan_class(view, room_wire::is_letter, 0, usize::MAX),
            Self::Channel => {
                if view.is_empty() || !room_wire::is_sign(view[0]) {
                    0
                } else {
                    1 + scan_class(&view[1..], room_wire::is_hex, 0, usize::MAX)
                }
            }
            Self::Digit => scan_class(view, room_wire::is_digit, 0, usize::MAX),
        }
    }

    fn broken(self) -> FrameError {
        match self {
            Self::Word => FrameError::VerbBroken,
            Self::Channel => FrameError::ChannelBroken,
            Self::Digit => FrameError::CountBroken,
        }
    }

    fn too_large(self, max: usize) -> FrameError {
        match self {
            Self::Word => FrameError::VerbTooLarge { max },
            Self::Channel => FrameError::ChannelTooLarge { max },
            Self::Digit => FrameError::CountTooLarge { max },
        }
    }
}

/// Ensure the staging buffer has at least one unread byte, refilling it
/// from the transport if it was exhausted. Leaves `*staging_pos ==
/// *staging_len` (i.e. zero bytes available) to signal a clean
/// end-of-stream. Shared by `StreamCodec` and `StreamReader` so the
/// read-side state machine has exactly one implementation regardless of
/// whether the stream is split.
async fn fill_staging<R: TransportRead>(
    transport: &mut R,
    staging: &mut [u8],
    staging_pos: &mut usize,
    staging_len: &mut usize,
) -> Result<(), TransportError> {
    if *staging_pos >= *staging_len {
        *staging_len = transport.read(staging).await?;
        *staging_pos = 0;
    }
    Ok(())
}

/// The shared field-reading template of §4.3.1: scan a run of
/// `class`-bytes terminated by exactly one blank byte, assembling the
/// field across as many raw reads as needed, capped at `max_len`.
/// Transport errors propagate unchanged; running out of input before a
/// terminator is seen is a `FrameError`.
async fn read_field<R: TransportRead>(
    transport: &mut R,
    staging: &mut [u8],
    staging_pos: &mut usize,
    staging_len: &mut usize,
    class: FieldClass,
    max_len: usize,
) -> Result<Vec<u8>, RoomError> {
    let mut scratch = Vec::new();
    loop {
        fill_staging(transport, staging, staging_pos, staging_len).await?;
        let available = *staging_len - *staging_pos;
        if available == 0 {
            return Err(class.broken().into());
        }

        let chunk_start = *staging_pos;
        let scanned = {
            let chunk = &staging[chunk_start..*staging_len];
            class.scan(chunk)
        };
        let stop_is_blank = scanned < available && room_wire::is_blank(staging[chunk_start + scanned]);
        let field_complete = scanned < available;
        let consumed = if stop_is_blank { scanned + 1 } else { scanned };

        if scratch.len() + scanned > max_len {
            return Err(class.too_large(max_len).into());
        }
        scratch.extend_from_slice(&staging[chunk_start..chunk_start + scanned]);
        *staging_pos = chunk_start + consumed;

        if field_complete {
            return Ok(scratch);
        }
        // The whole available chunk was class bytes with no stop byte in
        // view yet; loop for more input.
    }
}

async fn read_content<R: TransportRead>(
    transport: &mut R,
    staging: &mut [u8],
    staging_pos: &mut usize,
    staging_len: &mut usize,
    options: &StreamOptions,
    content_len: u64,
) -> Result<ContentBuffer, RoomError> {
    let mut buffer = ContentBuffer::allocate(
        content_len,
        options.max_fast_buffering,
        &options.temp_content_folder,
        &options.temp_content_prefix,
    )
    .await
    .map_err(TransportError::from)?;

    let mut remaining = content_len;
    while remaining > 0 {
        fill_staging(transport, staging, staging_pos, staging_len).await?;
        let available = (*staging_len - *staging_pos) as u64;
        if available == 0 {
            return Err(FrameError::ContentBroken.into());
        }
        let take = std::cmp::min(available, remaining) as usize;
        let start = *staging_pos;
        buffer
            .write_chunk(&staging[start..start + take])
            .await
            .map_err(TransportError::from)?;
        *staging_pos += take;
        remaining -= take as u64;
    }
    buffer.rewind().await.map_err(TransportError::from)?;
    Ok(buffer)
}

/// Read one `Message` from the transport, per §4.3.1.
async fn read_message<R: TransportRead>(
    transport: &mut R,
    staging: &mut [u8],
    staging_pos: &mut usize,
    staging_len: &mut usize,
    options: &StreamOptions,
) -> Result<RoomMessage, RoomError> {
    let verb_bytes = read_field(
        transport,
        staging,
        staging_pos,
        staging_len,
        FieldClass::Word,
        options.max_verb_length,
    )
    .await?;
    let verb = Verb::try_parse(&verb_bytes, options.max_verb_length)?;

    let channel_bytes = read_field(
        transport,
        staging,
        staging_pos,
        staging_len,
        FieldClass::Channel,
        options.max_channel_length,
    )
    .await?;
    let channel = Channel::try_parse(&channel_bytes, options.max_channel_length)?;

    let count_bytes = read_field(
        transport,
        staging,
        staging_pos,
        staging_len,
        FieldClass::Digit,
        options.max_count_length,
    )
    .await?;
    let count = Count::try_parse(&count_bytes, options.max_count_length)?;
    let content_len = count.checked_value(options.max_content_length)?;

    let content = read_content(transport, staging, staging_pos, staging_len, options, content_len).await?;

    Ok(Message::new(verb, channel, content))
}

/// `transport.write` may write fewer bytes than requested; retry until the
/// whole slice has gone out, per §4.3.2. A zero-byte write means the
/// transport closed mid-write.
async fn write_all_retrying<W: TransportWrite>(transport: &mut W, mut buf: &[u8]) -> Result<(), RoomError> {
    while !buf.is_empty() {
        let n = transport.write(buf).await?;
        if n == 0 {
            return Err(TransportError::Closed.into());
        }
        buf = &buf[n..];
    }
    Ok(())
}

/// Write one `Message` to the transport, per §4.3.2. The count field is
/// derived from `message.content.len()`, never taken on faith from the
/// caller. All fields are validated before any byte hits the wire.
async fn write_message<W: TransportWrite>(
    transport: &mut W,
    options: &StreamOptions,
    message: &mut RoomMessage,
) -> Result<(), RoomError> {
    if message.verb.as_bytes().len() > options.max_verb_length {
        return Err(FrameError::VerbTooLarge {
            max: options.max_verb_length,
        }
        .into());
    }
    if message.channel.as_bytes().len() > options.max_channel_length {
        return Err(FrameError::ChannelTooLarge {
            max: options.max_channel_length,
        }
        .into());
    }
    let content_len = message.content.len();
    if content_len > options.max_content_length {
        return Err(FrameError::ContentTooLarge {
            len: content_len,
            max: options.max_content_length,
        }
        .into());
    }
    let count = Count::from_u64(content_len);
    if count.as_bytes().len() > options.max_count_length {
        return Err(FrameError::CountTooLarge {
            max: options.max_count_length,
        }
        .into());
    }

    write_all_retrying(transport, message.verb.as_bytes()).await?;
    write_all_retrying(transport, b" ").await?;
    write_all_retrying(transport, message.channel.as_bytes()).await?;
    write_all_retrying(transport, b" ").await?;
    write_all_retrying(transport, count.as_bytes()).await?;
    write_all_retrying(transport, b" ").await?;

    message.content.rewind().await.map_err(TransportError::from)?;
    let write_buffer_size = options.write_buffer_size;
    let mut scratch = vec![0u8; write_buffer_size];
    loop {
        let n = message
            .content
            .read_chunk(&mut scratch)
            .await
            .map_err(TransportError::from)?;
        if n == 0 {
            break;
        }
        write_all_retrying(transport, &scratch[..n]).await?;
    }
    Ok(())
}

/// Reads and writes Room messages over a single `Transport`. Not `Clone`:
/// a stream must not have concurrent reads, nor concurrent writes. Use
/// this when one task owns the whole stream for its lifetime (a one-shot
/// encode/decode in a test, a half-duplex protocol). A service that runs
/// an independent listen loop and transmit loop per stream should call
/// [`StreamCodec::split`] instead, so the two loops never share a lock.
pub struct StreamCodec<T> {
    transport: T,
    options: StreamOptions,
    staging: Vec<u8>,
    staging_pos: usize,
    staging_len: usize,
}

impl<T: Transport> StreamCodec<T> {
    pub fn new(transport: T, options: StreamOptions) -> Self {
        let read_buffer_size = options.read_buffer_size;
        Self {
            transport,
            options,
            staging: vec![0u8; read_buffer_size],
            staging_pos: 0,
            staging_len: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Read one `Message` from the transport, per §4.3.1.
    pub async fn read_message(&mut self) -> Result<RoomMessage, RoomError> {
        read_message(
            &mut self.transport,
            &mut self.staging,
            &mut self.staging_pos,
            &mut self.staging_len,
            &self.options,
        )
        .await
    }

    /// Write one `Message` to the transport, per §4.3.2.
    pub async fn write_message(&mut self, message: &mut RoomMessage) -> Result<(), RoomError> {
        write_message(&mut self.transport, &self.options, message).await
    }
}

impl<T: SplitTransport> StreamCodec<T> {
    /// Split into independent reader and writer halves, each carrying its
    /// own staging state and its own half of the transport. Any bytes
    /// already buffered from a prior read are preserved in the reader
    /// half. Per §5, a listen loop holding the reader's lock and a
    /// transmit loop holding the writer's lock never contend for the same
    /// guard — they touch disjoint state from here on.
    pub fn split(self) -> (StreamReader<T::Reader>, StreamWriter<T::Writer>) {
        let (read_half, write_half) = self.transport.split();
        let reader = StreamReader {
            transport: read_half,
            options: self.options.clone(),
            staging: self.staging,
            staging_pos: self.staging_pos,
            staging_len: self.staging_len,
        };
        let writer = StreamWriter {
            transport: write_half,
            options: self.options,
        };
        (reader, writer)
    }
}

/// The read half of a split `StreamCodec`: owns the read staging buffer
/// and the transport's read half. Independent of `StreamWriter` — nothing
/// it does can block a transmit loop holding the writer's lock.
pub struct StreamReader<R> {
    transport: R,
    options: StreamOptions,
    staging: Vec<u8>,
    staging_pos: usize,
    staging_len: usize,
}

impl<R: TransportRead> StreamReader<R> {
    pub fn new(transport: R, options: StreamOptions) -> Self {
        let read_buffer_size = options.read_buffer_size;
        Self {
            transport,
            options,
            staging: vec![0u8; read_buffer_size],
            staging_pos: 0,
            staging_len: 0,
        }
    }

    pub fn transport(&self) -> &R {
        &self.transport
    }

    pub fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    /// Read one `Message` from the transport, per §4.3.1.
    pub async fn read_message(&mut self) -> Result<RoomMessage, RoomError> {
        read_message(
            &mut self.transport,
            &mut self.staging,
            &mut self.staging_pos,
            &mut self.staging_len,
            &self.options,
        )
        .await
    }
}

/// The write half of a split `StreamCodec`: owns the transport's write
/// half. Independent of `StreamReader` — nothing it does can block a
/// listen loop parked in a read on the reader's lock.
pub struct StreamWriter<W> {
    transport: W,
    options: StreamOptions,
}

impl<W: TransportWrite> StreamWriter<W> {
    pub fn new(transport: W, options: StreamOptions) -> Self {
        Self { transport, options }
    }

    /// Write one `Message` to the transport, per §4.3.2.
    pub async fn write_message(&mut self, message: &mut RoomMessage) -> Result<(), RoomError> {
        write_message(&mut self.transport, &self.options, message).await
    }
}
