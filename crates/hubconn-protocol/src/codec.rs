use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};
use crate::json::{decode_message, encode_message, DEFAULT_MAX_MESSAGE_SIZE};
use crate::message::HubMessage;
use crate::protocol::Decoded;

/// `tokio_util` codec for the JSON hub protocol.
///
/// Same framing as [`JsonHubProtocol`](crate::JsonHubProtocol), for hosts that
/// drive connections with `Framed` instead of blocking reads.
#[derive(Debug, Clone)]
pub struct HubCodec {
    max_message_size: usize,
    // Bytes of the buffered partial message already searched for a separator.
    next_index: usize,
}

impl HubCodec {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            next_index: 0,
        }
    }
}

impl Default for HubCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HubCodec {
    type Item = HubMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<HubMessage>> {
        match decode_message(src, self.next_index, self.max_message_size) {
            Decoded::Incomplete { scanned } => {
                self.next_index = scanned;
                Ok(None)
            }
            Decoded::Complete { consumed, message } => {
                self.next_index = 0;
                src.advance(consumed);
                message.map(Some)
            }
        }
    }
}

impl Encoder<HubMessage> for HubCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: HubMessage, dst: &mut BytesMut) -> Result<()> {
        encode_message(&item, dst)
    }
}
