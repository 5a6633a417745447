//! Lexical scanners and wire token types for the Room protocol.
//!
//! `Verb`, `Channel`, and `Count` are validated byte-slice wrappers with
//! parse/verify/format contracts; `Message` ties them together with an
//! opaque content representation. This crate does no I/O — `room-codec`
//! builds the streaming parser/serializer on top of it.

mod channel;
mod count;
mod error;
mod lex;
mod message;
mod verb;

pub use channel::{Channel, DEFAULT_MAX_CHANNEL_LENGTH};
pub use count::{Count, DEFAULT_MAX_CONTENT_LENGTH, DEFAULT_MAX_COUNT_LENGTH};
pub use error::FrameError;
pub use lex::{is_blank, is_digit, is_hex, is_letter, is_sign, scan_blank, scan_class, scan_digit, scan_hex, scan_word};
pub use message::Message;
pub use verb::{Verb, DEFAULT_MAX_VERB_LENGTH};
