use crate::message::MessageKind;

/// Errors that can occur while encoding or decoding hub messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The message body is not valid JSON for a hub message.
    #[error("invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The `type` discriminant is not one of the known message kinds.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// A field the message kind requires is absent.
    #[error("{kind} message missing required field '{field}'")]
    MissingField {
        kind: MessageKind,
        field: &'static str,
    },

    /// More bytes were buffered than a single message may occupy.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// An I/O error occurred while writing a message.
    #[error("protocol I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer accepted zero bytes before the message was fully written.
    #[error("connection closed (incomplete message written)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
