use std::io::Write;
use std::sync::Arc;

use crate::error::Result;
use crate::message::HubMessage;

/// Outcome of one decode attempt against buffered bytes.
#[derive(Debug)]
pub enum Decoded {
    /// The buffer does not yet hold a whole message. Nothing was consumed.
    ///
    /// The first `scanned` bytes hold no message boundary; the caller passes
    /// this back on the next attempt so they are not searched again.
    Incomplete { scanned: usize },
    /// The first `consumed` bytes formed one message, or one malformed frame.
    Complete {
        consumed: usize,
        message: Result<HubMessage>,
    },
}

/// A pluggable hub wire protocol.
///
/// `decode` only borrows the buffer: a protocol cannot eat bytes while
/// reporting [`Decoded::Incomplete`], so the caller owns all buffer
/// bookkeeping and advances exactly `consumed` bytes on completion.
///
/// The caller also keeps the `scanned` offset from the last `Incomplete` and
/// resets it to zero after advancing, which keeps reassembly of a message
/// that arrives in many reads linear in its size.
pub trait HubProtocol: Send + Sync {
    /// Protocol name for diagnostics (`"json"`).
    fn name(&self) -> &'static str;

    /// Try to parse one message from the front of `src`, knowing that
    /// `src[..scanned]` holds no message boundary.
    fn decode(&self, src: &[u8], scanned: usize) -> Decoded;

    /// Serialize `message` and write it, fully, to `dst`.
    fn write_message(&self, message: &HubMessage, dst: &mut dyn Write) -> Result<()>;
}

impl<P: HubProtocol + ?Sized> HubProtocol for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn decode(&self, src: &[u8], scanned: usize) -> Decoded {
        (**self).decode(src, scanned)
    }

    fn write_message(&self, message: &HubMessage, dst: &mut dyn Write) -> Result<()> {
        (**self).write_message(message, dst)
    }
}
