use std::fmt;

use crate::error::FrameError;
use crate::lex::{is_sign, scan_hex};

/// Default cap on a Channel's encoded length, per §6.2.
pub const DEFAULT_MAX_CHANNEL_LENGTH: usize = 32;

/// A signed integer encoded as a single sign byte followed by one or more
/// hex digits: `[+-][0-9A-Fa-f]+`.
///
/// The magnitude is hexadecimal; the sign is mandatory and explicit. The
/// distinguished values `+0` (hub-peer) and `-1` (broadcast) carry meaning
/// only at the routing layer above this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(Box<[u8]>);

impl Channel {
    /// `view.len() >= 2`, `view[0]` is a sign byte, and the remainder is an
    /// unbroken run of hex digits covering the rest of the view.
    pub fn verify(view: &[u8]) -> bool {
        view.len() >= 2 && is_sign(view[0]) && 1 + scan_hex(&view[1..], 0, usize::MAX) == view.len()
    }

    /// Parse a Channel from bytes already known to satisfy `max_len`.
    pub fn try_parse(view: &[u8], max_len: usize) -> Result<Self, FrameError> {
        if view.len() > max_len {
            return Err(FrameError::ChannelTooLarge { max: max_len });
        }
        if !Self::verify(view) {
            return Err(FrameError::ChannelBroken);
        }
        Ok(Self(view.into()))
    }

    /// Build a Channel from bytes already validated by the streaming codec.
    pub fn from_validated(bytes: Vec<u8>) -> Self {
        debug_assert!(Self::verify(&bytes), "from_validated given invalid channel bytes");
        Self(bytes.into())
    }

    /// Render a signed 64-bit integer as canonical Channel bytes:
    /// `"+{hex}"` for `n >= 0`, `"-{hex}"` for `n < 0`, lowercase hex, no
    /// leading zeros (other than a single `0` for zero itself).
    pub fn from_i64(n: i64) -> Self {
        let sign = if n < 0 { b'-' } else { b'+' };
        let magnitude = n.unsigned_abs();
        let mut bytes = vec![sign];
        bytes.extend_from_slice(format!("{magnitude:x}").as_bytes());
        Self(bytes.into())
    }

    /// Render a signed 32-bit integer the same way.
    pub fn from_i32(n: i32) -> Self {
        Self::from_i64(n as i64)
    }

    /// The raw validated bytes (`sign` + hex digits).
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn magnitude_and_sign(&self) -> (bool, &[u8]) {
        (self.0[0] == b'-', &self.0[1..])
    }

    /// Convert to a signed 64-bit integer. Returns `None` if the magnitude
    /// doesn't fit (more than 16 hex digits' worth, or overflows on negation).
    pub fn to_i64(&self) -> Option<i64> {
        let (negative, hex) = self.magnitude_and_sign();
        let hex = std::str::from_utf8(hex).ok()?;
        let magnitude = u64::from_str_radix(hex, 16).ok()?;
        if negative {
            if magnitude > (i64::MAX as u64) + 1 {
                return None;
            }
            // i64::MIN.unsigned_abs() == i64::MAX as u64 + 1, handled via wrapping negation.
            Some((magnitude as i64).wrapping_neg())
        } else {
            i64::try_from(magnitude).ok()
        }
    }

    /// Convert to a signed 32-bit integer. Returns `None` if out of range.
    pub fn to_i32(&self) -> Option<i32> {
        self.to_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bytes are ASCII by construction (sign + hex digits).
        f.write_str(std::str::from_utf8(&self.0).expect("Channel bytes are ASCII"))
    }
}
