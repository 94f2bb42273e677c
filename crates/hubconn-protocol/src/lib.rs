//! Hub message model and pluggable wire protocols.
//!
//! Every message exchanged on a hub connection is one of seven kinds, each
//! identified on the wire by a fixed integer discriminant:
//!
//! | Type | Kind              |
//! |------|-------------------|
//! | 1    | Invocation        |
//! | 2    | StreamItem        |
//! | 3    | Completion        |
//! | 4    | StreamInvocation  |
//! | 5    | CancelInvocation  |
//! | 6    | Ping              |
//! | 7    | Close             |
//!
//! A [`HubProtocol`] turns messages into bytes and back. The bundled
//! [`JsonHubProtocol`] writes each message as a JSON object terminated by the
//! ASCII record separator (`0x1E`).

#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod json;
pub mod message;
pub mod protocol;

#[cfg(feature = "async")]
pub use codec::HubCodec;
pub use error::{ProtocolError, Result};
pub use json::{
    decode_message, encode_message, JsonHubProtocol, DEFAULT_MAX_MESSAGE_SIZE, RECORD_SEPARATOR,
};
pub use message::{
    CancelInvocation, Close, Completion, HubMessage, Invocation, MessageKind, StreamInvocation,
    StreamItem,
};
pub use protocol::{Decoded, HubProtocol};
