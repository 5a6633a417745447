use std::fmt;
use std::io;

use room_wire::FrameError;

/// Everything that can go wrong talking to a `Transport`.
#[derive(Debug)]
pub enum TransportError {
    /// The underlying I/O primitive returned an error.
    Io(io::Error),
    /// The transport observed a clean close while a read or write was in
    /// flight.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "transport I/O error: {err}"),
            Self::Closed => write!(f, "transport is closed"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Closed => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// A codec-level operation was attempted in a state that forbids it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseError {
    /// The session or stream has already been disposed.
    Disposed,
    /// The service has not been started (or was stopped) when the call
    /// was made.
    NotRunning,
}

impl fmt::Display for UseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disposed => f.write_str("stream has been disposed"),
            Self::NotRunning => f.write_str("service is not running"),
        }
    }
}

impl std::error::Error for UseError {}

/// The union of everything a codec read/write or a service operation can
/// fail with.
#[derive(Debug)]
pub enum RoomError {
    Frame(FrameError),
    Transport(TransportError),
    Use(UseError),
    /// A blocking wait (listen, rate-limit backoff) was cancelled before it
    /// completed.
    Cancelled,
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Use(err) => write!(f, "{err}"),
            Self::Cancelled => f.write_str("operation was cancelled"),
        }
    }
}

impl std::error::Error for RoomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Frame(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Use(err) => Some(err),
            Self::Cancelled => None,
        }
    }
}

impl From<FrameError> for RoomError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl From<TransportError> for RoomError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl From<UseError> for RoomError {
    fn from(err: UseError) -> Self {
        Self::Use(err)
    }
}

impl From<io::Error> for RoomError {
    fn from(err: io::Error) -> Self {
        Self::Transport(TransportError::Io(err))
    }
}
