use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use room_codec::{RoomError, SplitTransport, StreamCodec, StreamReader, StreamWriter};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::handler::{silent_logger, Logger, ReceiveHandler};
use crate::options::ServiceOptions;

/// Identifies one stream registered with a `RoomService`. Assigned
/// sequentially at `add_stream` time; meaningless outside the service that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

struct OutboxItem {
    stream_id: StreamId,
    message: room_codec::RoomMessage,
}

/// A handle to the service's shared transmit queue, cheap to clone and
/// hand to a `ReceiveHandler`.
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::UnboundedSender<OutboxItem>,
}

impl OutboundQueue {
    /// Enqueue `message` for transmission on `stream_id`. FIFO across all
    /// producers, per §5's ordering guarantee. Fails only once the
    /// service has been disposed.
    pub fn enqueue(&self, stream_id: StreamId, message: room_codec::RoomMessage) -> Result<(), room_codec::UseError> {
        self.tx
            .send(OutboxItem { stream_id, message })
            .map_err(|_| room_codec::UseError::Disposed)
    }
}

/// A registered stream's two independently lockable halves. The listen
/// loop only ever locks `reader`; the transmit loop only ever locks
/// `writer` — per §5, they touch disjoint staging buffers and must never
/// contend for the same guard.
struct StreamHandle<T: SplitTransport> {
    reader: Arc<Mutex<StreamReader<T::Reader>>>,
    writer: Arc<Mutex<StreamWriter<T::Writer>>>,
}

impl<T: SplitTransport> Clone for StreamHandle<T> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            writer: Arc::clone(&self.writer),
        }
    }
}

type StreamMap<T> = Arc<Mutex<HashMap<StreamId, StreamHandle<T>>>>;

/// Composes live `StreamCodec` instances with application logic: one
/// cooperative listen-loop task per stream, plus a single shared transmit
/// loop draining the process-wide pending queue in strict FIFO order.
///
/// Not generic over the handler or logger type to keep `RoomService<T>`
/// nameable in application code; both are stored as trait objects.
pub struct RoomService<T> {
    options: ServiceOptions,
    handler: Arc<dyn ReceiveHandler>,
    logger: Logger,
    running: Arc<std::sync::atomic::AtomicBool>,
    disposed: Arc<std::sync::atomic::AtomicBool>,
    cancel: CancellationToken,
    streams: StreamMap<T>,
    next_stream_id: AtomicU64,
    outbox: OutboundQueue,
    outbox_rx: Mutex<Option<mpsc::UnboundedReceiver<OutboxItem>>>,
    transmit_task: Mutex<Option<JoinHandle<()>>>,
    listen_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T> RoomService<T>
where
    T: SplitTransport + 'static,
{
    pub fn new(options: ServiceOptions, handler: Arc<dyn ReceiveHandler>) -> Self {
        Self::with_logger(options, handler, silent_logger())
    }

    pub fn with_logger(options: ServiceOptions, handler: Arc<dyn ReceiveHandler>, logger: Logger) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            options,
            handler,
            logger,
            running: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            disposed: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            streams: Arc::new(Mutex::new(HashMap::new())),
            next_stream_id: AtomicU64::new(0),
            outbox: OutboundQueue { tx },
            outbox_rx: Mutex::new(Some(rx)),
            transmit_task: Mutex::new(None),
            listen_tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// A cloneable handle for enqueuing outbound messages, e.g. to hand to
    /// a `ReceiveHandler` constructed outside this service.
    pub fn outbox(&self) -> OutboundQueue {
        self.outbox.clone()
    }

    /// Mark the service running and spawn the shared transmit loop. A
    /// service may only be started once — after `stop()`, `dispose()` is
    /// the only valid next call.
    pub async fn start(&self) -> Result<(), room_codec::UseError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(room_codec::UseError::Disposed);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let Some(rx) = self.outbox_rx.lock().await.take() else {
            // Already started once and since `stop()`-ped: this service
            // does not support a stop/restart cycle, only stop/dispose.
            self.running.store(false, Ordering::Release);
            return Err(room_codec::UseError::Disposed);
        };

        let task = tokio::spawn(run_transmit_loop(
            rx,
            Arc::clone(&self.streams),
            Arc::clone(&self.running),
            self.logger.clone(),
            self.cancel.clone(),
        ));
        *self.transmit_task.lock().await = Some(task);
        Ok(())
    }

    /// Clear the running flag and wake every suspended loop so they notice
    /// promptly. Per §4.6.3 this does not release resources — only
    /// `dispose()` does.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.cancel.cancel();
    }

    /// Register a new stream and spawn its listen loop. Requires the
    /// service to be running. The codec is split into independent reader
    /// and writer halves immediately — the listen loop below only ever
    /// touches the reader, the shared transmit loop only ever touches the
    /// writer.
    pub async fn add_stream(
        &self,
        codec: StreamCodec<T>,
    ) -> Result<StreamId, room_codec::UseError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(room_codec::UseError::Disposed);
        }
        if !self.running.load(Ordering::Acquire) {
            return Err(room_codec::UseError::NotRunning);
        }
        let stream_id = StreamId(self.next_stream_id.fetch_add(1, Ordering::Relaxed));
        let (reader, writer) = codec.split();
        let handle = StreamHandle {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        };
        self.streams.lock().await.insert(stream_id, handle.clone());

        let task = tokio::spawn(run_listen_loop(
            stream_id,
            handle.reader,
            self.options,
            Arc::clone(&self.running),
            Arc::clone(&self.handler),
            self.outbox.clone(),
            self.logger.clone(),
            self.cancel.clone(),
        ));
        self.listen_tasks.lock().await.push(task);
        Ok(stream_id)
    }

    /// Enqueue a message for transmission on `stream_id`.
    pub fn enqueue(&self, stream_id: StreamId, message: room_codec::RoomMessage) -> Result<(), room_codec::UseError> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(room_codec::UseError::Disposed);
        }
        self.outbox.enqueue(stream_id, message)
    }

    /// Stop the service, cancel every suspended loop, and join their
    /// tasks. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.running.store(false, Ordering::Release);
        self.cancel.cancel();

        if let Some(task) = self.transmit_task.lock().await.take() {
            let _ = task.await;
        }
        let tasks = std::mem::take(&mut *self.listen_tasks.lock().await);
        for task in tasks {
            let _ = task.await;
        }
        self.streams.lock().await.clear();
    }
}

/// Per-stream listen loop, §4.6.1: a soft, content-bytes-only token
/// bucket refilling every second throttles an abusive peer without
/// closing the connection.
async fn run_listen_loop<T: SplitTransport>(
    stream_id: StreamId,
    reader: Arc<Mutex<StreamReader<T::Reader>>>,
    options: ServiceOptions,
    running: Arc<std::sync::atomic::AtomicBool>,
    handler: Arc<dyn ReceiveHandler>,
    outbox: OutboundQueue,
    logger: Logger,
    cancel: CancellationToken,
) {
    let mut window_start = tokio::time::Instant::now();
    let mut rate: u64 = 0;

    loop {
        if !running.load(Ordering::Acquire) {
            break;
        }
        {
            let guard = reader.lock().await;
            if !guard.is_alive() {
                break;
            }
        }

        let read_result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = async {
                let mut guard = reader.lock().await;
                guard.read_message().await
            } => result,
        };

        let message = match read_result {
            Ok(message) => message,
            Err(err) => {
                report(&logger, stream_id, &err);
                break;
            }
        };

        let now = tokio::time::Instant::now();
        if now.duration_since(window_start) >= Duration::from_secs(1) {
            rate = 0;
            window_start = now;
        }
        rate += message.content.len();
        if rate > options.max_stream_rate {
            let seconds = rate as f64 / options.max_stream_rate as f64;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(Duration::from_secs_f64(seconds)) => {}
            }
            // Reset rather than let `rate` keep compounding across
            // consecutive over-budget messages (see DESIGN.md).
            rate = options.max_stream_rate;
        }

        handler.on_receive(stream_id, message, outbox.clone()).await;
    }
}

/// Shared transmit loop, §4.6.2: strict FIFO across all producers. Blocks
/// on the channel instead of polling with a fixed sleep — the idiomatic
/// async replacement for the source's poll loop (see DESIGN.md).
async fn run_transmit_loop<T: SplitTransport>(
    mut rx: mpsc::UnboundedReceiver<OutboxItem>,
    streams: StreamMap<T>,
    running: Arc<std::sync::atomic::AtomicBool>,
    logger: Logger,
    cancel: CancellationToken,
) {
    loop {
        if !running.load(Ordering::Acquire) {
            break;
        }
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            item = rx.recv() => item,
        };
        let Some(mut item) = item else {
            break;
        };

        let writer = streams.lock().await.get(&item.stream_id).map(|handle| Arc::clone(&handle.writer));
        let Some(writer) = writer else {
            continue;
        };
        let mut guard = writer.lock().await;
        if let Err(err) = guard.write_message(&mut item.message).await {
            report(&logger, item.stream_id, &err);
        }
        // `item.message.content` drops here unless the write already
        // consumed it into a retained buffer — ownership, not a manual
        // reference count, decides whether it's freed.
    }
}

fn report(logger: &Logger, stream_id: StreamId, err: &RoomError) {
    tracing::warn!(stream_id = stream_id.0, error = %err, "room-service loop terminating");
    logger(&format!("stream {}: {err}", stream_id.0));
}
