//! Framing errors: violations of the lexical or size rules of a Room message.
//!
//! Modeled as a hand-written enum with `Display`/`Error` impls rather than
//! `thiserror`, matching how this codebase reports its other protocol-level
//! errors (see `HubSessionError` in the shm transport).

use std::fmt;

/// The peer (or caller, for writes) violated a framing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The verb field exceeded `max_verb_length` before a terminator was seen.
    VerbTooLarge { max: usize },
    /// The stream ended before the verb field terminated.
    VerbBroken,
    /// The channel field exceeded `max_channel_length`.
    ChannelTooLarge { max: usize },
    /// The stream ended before the channel field terminated, or the channel
    /// bytes did not match `sign hex+`.
    ChannelBroken,
    /// The count field exceeded `max_count_length`.
    CountTooLarge { max: usize },
    /// The stream ended before the count field terminated, or the count
    /// bytes did not match `digit+`.
    CountBroken,
    /// The declared content length exceeded `max_content_length`.
    ContentTooLarge { len: u64, max: u64 },
    /// The stream ended before the declared content length was satisfied.
    ContentBroken,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerbTooLarge { max } => write!(f, "verb too large (max {max} bytes)"),
            Self::VerbBroken => write!(f, "verb broken (stream ended before terminator)"),
            Self::ChannelTooLarge { max } => write!(f, "channel too large (max {max} bytes)"),
            Self::ChannelBroken => write!(f, "channel broken (stream ended or malformed)"),
            Self::CountTooLarge { max } => write!(f, "count too large (max {max} bytes)"),
            Self::CountBroken => write!(f, "count broken (stream ended or malformed)"),
            Self::ContentTooLarge { len, max } => {
                write!(f, "content too large ({len} bytes, max {max})")
            }
            Self::ContentBroken => write!(f, "content broken (stream ended before count bytes)"),
        }
    }
}

impl std::error::Error for FrameError {}
