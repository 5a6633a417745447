/// Configuration for a `RoomService`'s shared behavior. Per-stream knobs
/// (buffer sizes, field caps) live in `StreamOptions`, owned by each
/// stream's codec instead.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Soft cap, in content bytes per second, enforced per listen loop. See
    /// §4.6.1: a stream that exceeds this is throttled with a sleep, never
    /// disconnected.
    pub max_stream_rate: u64,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            // 1 MiB/s, per §6.2's ingress rate default.
            max_stream_rate: 1024 * 1024,
        }
    }
}
