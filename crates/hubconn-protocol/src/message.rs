use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtocolError;

/// Wire discriminant of a hub message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Invocation = 1,
    StreamItem = 2,
    Completion = 3,
    StreamInvocation = 4,
    CancelInvocation = 5,
    Ping = 6,
    Close = 7,
}

impl MessageKind {
    /// The integer written in the `type` field.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name for logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Invocation => "invocation",
            MessageKind::StreamItem => "stream_item",
            MessageKind::Completion => "completion",
            MessageKind::StreamInvocation => "stream_invocation",
            MessageKind::CancelInvocation => "cancel_invocation",
            MessageKind::Ping => "ping",
            MessageKind::Close => "close",
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageKind::Invocation),
            2 => Ok(MessageKind::StreamItem),
            3 => Ok(MessageKind::Completion),
            4 => Ok(MessageKind::StreamInvocation),
            5 => Ok(MessageKind::CancelInvocation),
            6 => Ok(MessageKind::Ping),
            7 => Ok(MessageKind::Close),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request to run `target` with positional arguments.
///
/// Invocations sent by this side are one-way and carry no id. Invocations
/// received from a peer may carry one, in which case the peer expects a
/// [`Completion`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub invocation_id: Option<String>,
    pub target: String,
    pub arguments: Vec<Value>,
}

/// One element of a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamItem {
    pub invocation_id: String,
    pub item: Value,
}

/// Terminal response to a correlated invocation.
///
/// The protocol allows both `result` and `error` to be set; peers treat a
/// present `error` as failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub invocation_id: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// Request to run `target` and stream results back under `invocation_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInvocation {
    pub invocation_id: String,
    pub target: String,
    pub arguments: Vec<Value>,
}

/// Request to stop a running stream invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelInvocation {
    pub invocation_id: String,
}

/// Notification that the sender is closing the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Close {
    /// Why the connection closed. `None` is a normal close.
    pub error: Option<String>,
    pub allow_reconnect: bool,
}

/// A hub protocol message.
///
/// The wire discriminant is a function of the variant (see [`HubMessage::kind`]);
/// there is no way to construct a message whose `type` disagrees with its shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireMessage")]
pub enum HubMessage {
    Invocation(Invocation),
    StreamItem(StreamItem),
    Completion(Completion),
    StreamInvocation(StreamInvocation),
    CancelInvocation(CancelInvocation),
    Ping,
    Close(Close),
}

impl HubMessage {
    /// One-way invocation of `target`.
    pub fn invocation(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        HubMessage::Invocation(Invocation {
            invocation_id: None,
            target: target.into(),
            arguments,
        })
    }

    pub fn stream_item(invocation_id: impl Into<String>, item: Value) -> Self {
        HubMessage::StreamItem(StreamItem {
            invocation_id: invocation_id.into(),
            item,
        })
    }

    /// Completion; an empty `error` is treated as no error.
    pub fn completion(
        invocation_id: impl Into<String>,
        result: Option<Value>,
        error: Option<&str>,
    ) -> Self {
        HubMessage::Completion(Completion {
            invocation_id: invocation_id.into(),
            result,
            error: non_empty(error),
        })
    }

    pub fn ping() -> Self {
        HubMessage::Ping
    }

    /// Close notification; an empty `error` is a normal close.
    pub fn close(error: &str, allow_reconnect: bool) -> Self {
        HubMessage::Close(Close {
            error: non_empty(Some(error)),
            allow_reconnect,
        })
    }

    /// The wire discriminant for this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            HubMessage::Invocation(_) => MessageKind::Invocation,
            HubMessage::StreamItem(_) => MessageKind::StreamItem,
            HubMessage::Completion(_) => MessageKind::Completion,
            HubMessage::StreamInvocation(_) => MessageKind::StreamInvocation,
            HubMessage::CancelInvocation(_) => MessageKind::CancelInvocation,
            HubMessage::Ping => MessageKind::Ping,
            HubMessage::Close(_) => MessageKind::Close,
        }
    }

    /// The correlation id, for kinds that carry one.
    pub fn invocation_id(&self) -> Option<&str> {
        match self {
            HubMessage::Invocation(m) => m.invocation_id.as_deref(),
            HubMessage::StreamItem(m) => Some(&m.invocation_id),
            HubMessage::Completion(m) => Some(&m.invocation_id),
            HubMessage::StreamInvocation(m) => Some(&m.invocation_id),
            HubMessage::CancelInvocation(m) => Some(&m.invocation_id),
            HubMessage::Ping | HubMessage::Close(_) => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Flat record matching the JSON object layout of every message kind.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireMessage {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    invocation_id: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "present")]
    item: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    allow_reconnect: Option<bool>,
}

/// A field that appears on the wire, even as `null`, is `Some`; only an
/// absent field falls back to the `None` default.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Borrowed view used for serialization, so sends never clone payloads.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRef<'a> {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    invocation_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_reconnect: Option<bool>,
}

impl<'a> WireRef<'a> {
    fn empty(kind: MessageKind) -> Self {
        Self {
            kind: kind.as_u8(),
            invocation_id: None,
            target: None,
            arguments: None,
            item: None,
            result: None,
            error: None,
            allow_reconnect: None,
        }
    }

    fn from_message(message: &'a HubMessage) -> Self {
        let wire = Self::empty(message.kind());
        match message {
            HubMessage::Invocation(m) => Self {
                invocation_id: m.invocation_id.as_deref(),
                target: Some(&m.target),
                arguments: Some(&m.arguments),
                ..wire
            },
            HubMessage::StreamItem(m) => Self {
                invocation_id: Some(&m.invocation_id),
                item: Some(&m.item),
                ..wire
            },
            HubMessage::Completion(m) => Self {
                invocation_id: Some(&m.invocation_id),
                result: m.result.as_ref(),
                error: m.error.as_deref(),
                ..wire
            },
            HubMessage::StreamInvocation(m) => Self {
                invocation_id: Some(&m.invocation_id),
                target: Some(&m.target),
                arguments: Some(&m.arguments),
                ..wire
            },
            HubMessage::CancelInvocation(m) => Self {
                invocation_id: Some(&m.invocation_id),
                ..wire
            },
            HubMessage::Ping => wire,
            HubMessage::Close(m) => Self {
                error: m.error.as_deref(),
                allow_reconnect: Some(m.allow_reconnect),
                ..wire
            },
        }
    }
}

impl Serialize for HubMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRef::from_message(self).serialize(serializer)
    }
}

impl TryFrom<WireMessage> for HubMessage {
    type Error = ProtocolError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let kind = MessageKind::try_from(wire.kind)?;
        let missing = |field: &'static str| ProtocolError::MissingField { kind, field };

        let message = match kind {
            MessageKind::Invocation => HubMessage::Invocation(Invocation {
                invocation_id: wire.invocation_id,
                target: wire.target.ok_or_else(|| missing("target"))?,
                arguments: wire.arguments.ok_or_else(|| missing("arguments"))?,
            }),
            MessageKind::StreamItem => HubMessage::StreamItem(StreamItem {
                invocation_id: wire.invocation_id.ok_or_else(|| missing("invocationId"))?,
                item: wire.item.ok_or_else(|| missing("item"))?,
            }),
            MessageKind::Completion => HubMessage::Completion(Completion {
                invocation_id: wire.invocation_id.ok_or_else(|| missing("invocationId"))?,
                result: wire.result,
                error: non_empty(wire.error.as_deref()),
            }),
            MessageKind::StreamInvocation => HubMessage::StreamInvocation(StreamInvocation {
                invocation_id: wire.invocation_id.ok_or_else(|| missing("invocationId"))?,
                target: wire.target.ok_or_else(|| missing("target"))?,
                arguments: wire.arguments.ok_or_else(|| missing("arguments"))?,
            }),
            MessageKind::CancelInvocation => HubMessage::CancelInvocation(CancelInvocation {
                invocation_id: wire.invocation_id.ok_or_else(|| missing("invocationId"))?,
            }),
            MessageKind::Ping => HubMessage::Ping,
            MessageKind::Close => HubMessage::Close(Close {
                error: non_empty(wire.error.as_deref()),
                allow_reconnect: wire.allow_reconnect.unwrap_or(false),
            }),
        };
        Ok(message)
    }
}
