use crate::channel::Channel;
use crate::verb::Verb;

/// The tuple `(Verb, Channel, Content)`.
///
/// Generic over the content representation so this crate stays free of I/O:
/// `room-codec` instantiates `Message<ContentBuffer>`, property tests can
/// instantiate `Message<Vec<u8>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<Content> {
    pub verb: Verb,
    pub channel: Channel,
    pub content: Content,
}

impl<Content> Message<Content> {
    pub fn new(verb: Verb, channel: Channel, content: Content) -> Self {
        Self {
            verb,
            channel,
            content,
        }
    }

    /// Replace the content, keeping the verb and channel. Used when a
    /// handler re-enqueues the same content stream for outbound
    /// transmission but addresses a different channel.
    pub fn with_content<C2>(self, content: C2) -> Message<C2> {
        Message {
            verb: self.verb,
            channel: self.channel,
            content,
        }
    }
}
