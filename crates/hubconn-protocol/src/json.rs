use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::error::{ProtocolError, Result};
use crate::message::{HubMessage, WireMessage};
use crate::protocol::{Decoded, HubProtocol};

/// Terminator written after every JSON message (ASCII record separator).
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// Default maximum size of one message body: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Encode a message into the JSON wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────┬──────┐
/// │ JSON object                  │ 0x1E │
/// │ {"type":1,"target":"m",...}  │      │
/// └──────────────────────────────┴──────┘
/// ```
pub fn encode_message(message: &HubMessage, dst: &mut BytesMut) -> Result<()> {
    serde_json::to_writer((&mut *dst).writer(), message)?;
    dst.put_u8(RECORD_SEPARATOR);
    Ok(())
}

/// Decode one message from the front of `src`.
///
/// Returns [`Decoded::Incomplete`] until a record separator is buffered. The
/// search for it starts at `scanned`; bytes before that offset were already
/// searched by an earlier call. A body that fails to parse is still
/// `Complete`: its bytes are reported as consumed so the stream can move past
/// it.
pub fn decode_message(src: &[u8], scanned: usize, max_message_size: usize) -> Decoded {
    let start = scanned.min(src.len());
    let found = src[start..]
        .iter()
        .position(|&b| b == RECORD_SEPARATOR)
        .map(|i| start + i);
    let Some(end) = found else {
        if src.len() > max_message_size {
            return Decoded::Complete {
                consumed: src.len(),
                message: Err(ProtocolError::MessageTooLarge {
                    size: src.len(),
                    max: max_message_size,
                }),
            };
        }
        return Decoded::Incomplete { scanned: src.len() };
    };

    let consumed = end + 1;
    if end > max_message_size {
        return Decoded::Complete {
            consumed,
            message: Err(ProtocolError::MessageTooLarge {
                size: end,
                max: max_message_size,
            }),
        };
    }

    let message = serde_json::from_slice::<WireMessage>(&src[..end])
        .map_err(ProtocolError::from)
        .and_then(HubMessage::try_from);
    Decoded::Complete { consumed, message }
}

/// The JSON hub protocol: one JSON object per message, `0x1E`-terminated.
#[derive(Debug, Clone)]
pub struct JsonHubProtocol {
    max_message_size: usize,
}

impl JsonHubProtocol {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a protocol that rejects message bodies over `max_message_size` bytes.
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl Default for JsonHubProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl HubProtocol for JsonHubProtocol {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, src: &[u8], scanned: usize) -> Decoded {
        decode_message(src, scanned, self.max_message_size)
    }

    fn write_message(&self, message: &HubMessage, dst: &mut dyn Write) -> Result<()> {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        encode_message(message, &mut buf)?;
        if buf.len() - 1 > self.max_message_size {
            return Err(ProtocolError::MessageTooLarge {
                size: buf.len() - 1,
                max: self.max_message_size,
            });
        }

        let mut offset = 0usize;
        while offset < buf.len() {
            match dst.write(&buf[offset..]) {
                Ok(0) => return Err(ProtocolError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ProtocolError::Io(err)),
            }
        }

        loop {
            match dst.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ProtocolError::Io(err)),
            }
        }

        trace!(kind = %message.kind(), size = buf.len(), "wrote hub message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;
    use crate::message::{Completion, MessageKind};

    fn complete(decoded: Decoded) -> (usize, Result<HubMessage>) {
        match decoded {
            Decoded::Complete { consumed, message } => (consumed, message),
            Decoded::Incomplete { .. } => panic!("expected a complete message"),
        }
    }

    #[test]
    fn encoded_invocation_bytes() {
        let mut buf = BytesMut::new();
        encode_message(&HubMessage::invocation("m", vec![json!(1), json!(2)]), &mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            b"{\"type\":1,\"target\":\"m\",\"arguments\":[1,2]}\x1e"
        );
    }

    #[test]
    fn decode_needs_separator() {
        let body = br#"{"type":6}"#;
        assert!(matches!(
            decode_message(body, 0, DEFAULT_MAX_MESSAGE_SIZE),
            Decoded::Incomplete { scanned: 10 }
        ));
        assert!(matches!(
            decode_message(&[], 0, DEFAULT_MAX_MESSAGE_SIZE),
            Decoded::Incomplete { scanned: 0 }
        ));
    }

    #[test]
    fn decode_reports_consumed_and_leaves_trailing_bytes() {
        let mut wire = BytesMut::new();
        encode_message(&HubMessage::ping(), &mut wire).unwrap();
        let first_len = wire.len();
        encode_message(&HubMessage::close("", true), &mut wire).unwrap();

        let (consumed, message) = complete(decode_message(&wire, 0, DEFAULT_MAX_MESSAGE_SIZE));
        assert_eq!(consumed, first_len);
        assert_eq!(message.unwrap(), HubMessage::Ping);

        let (rest, message) = complete(decode_message(
            &wire[consumed..],
            0,
            DEFAULT_MAX_MESSAGE_SIZE,
        ));
        assert_eq!(consumed + rest, wire.len());
        assert_eq!(message.unwrap().kind(), MessageKind::Close);
    }

    #[test]
    fn malformed_body_is_complete_with_error() {
        let wire = b"{not json}\x1e{\"type\":6}\x1e";
        let (consumed, message) = complete(decode_message(wire, 0, DEFAULT_MAX_MESSAGE_SIZE));
        assert_eq!(consumed, 11);
        assert!(matches!(message, Err(ProtocolError::Json(_))));

        let (_, next) = complete(decode_message(
            &wire[consumed..],
            0,
            DEFAULT_MAX_MESSAGE_SIZE,
        ));
        assert_eq!(next.unwrap(), HubMessage::Ping);
    }

    #[test]
    fn unknown_type_keeps_its_variant() {
        let (_, message) = complete(decode_message(
            b"{\"type\":42}\x1e",
            0,
            DEFAULT_MAX_MESSAGE_SIZE,
        ));
        assert!(matches!(message, Err(ProtocolError::UnknownMessageType(42))));
    }

    #[test]
    fn missing_field_keeps_its_variant() {
        let (_, message) = complete(decode_message(
            b"{\"type\":3,\"result\":1}\x1e",
            0,
            DEFAULT_MAX_MESSAGE_SIZE,
        ));
        assert!(matches!(
            message,
            Err(ProtocolError::MissingField {
                kind: MessageKind::Completion,
                field: "invocationId"
            })
        ));
    }

    #[test]
    fn oversized_unterminated_buffer_is_rejected() {
        let wire = vec![b' '; 32];
        let (consumed, message) = complete(decode_message(&wire, 0, 16));
        assert_eq!(consumed, 32);
        assert!(matches!(message, Err(ProtocolError::MessageTooLarge { .. })));
    }

    #[test]
    fn oversized_terminated_body_is_rejected() {
        let mut wire = vec![b' '; 20];
        wire.push(RECORD_SEPARATOR);
        let (consumed, message) = complete(decode_message(&wire, 0, 16));
        assert_eq!(consumed, 21);
        assert!(matches!(message, Err(ProtocolError::MessageTooLarge { .. })));
    }

    #[test]
    fn search_resumes_at_scanned_offset() {
        // A separator inside the already-searched prefix is not looked at again.
        let wire = b"{\"type\":6}\x1e{\"type\":6";
        assert!(matches!(
            decode_message(wire, 11, DEFAULT_MAX_MESSAGE_SIZE),
            Decoded::Incomplete { scanned: 20 }
        ));

        // An offset past the end is clamped.
        assert!(matches!(
            decode_message(b"{}", 99, DEFAULT_MAX_MESSAGE_SIZE),
            Decoded::Incomplete { scanned: 2 }
        ));
    }

    #[test]
    fn chunked_large_message_is_searched_once() {
        let blob = "x".repeat(4 * 1024 * 1024);
        let mut wire = BytesMut::new();
        encode_message(&HubMessage::invocation("upload", vec![json!(blob)]), &mut wire).unwrap();

        let mut buffered = Vec::with_capacity(wire.len());
        let mut scanned = 0usize;
        let mut searched = 0usize;
        let mut decoded = None;
        for chunk in wire.chunks(1448) {
            buffered.extend_from_slice(chunk);
            searched += buffered.len() - scanned.min(buffered.len());
            match decode_message(&buffered, scanned, DEFAULT_MAX_MESSAGE_SIZE) {
                Decoded::Incomplete { scanned: next } => {
                    assert_eq!(next, buffered.len());
                    scanned = next;
                }
                Decoded::Complete { consumed, message } => {
                    assert_eq!(consumed, wire.len());
                    decoded = Some(message.unwrap());
                }
            }
        }

        assert_eq!(searched, wire.len());
        match decoded {
            Some(HubMessage::Invocation(inv)) => assert_eq!(inv.target, "upload"),
            other => panic!("expected invocation, got {other:?}"),
        }
    }

    #[test]
    fn write_message_decodes_back() {
        let protocol = JsonHubProtocol::new();
        let mut out = Cursor::new(Vec::new());
        let message = HubMessage::Completion(Completion {
            invocation_id: "9".to_string(),
            result: Some(json!([1, "two"])),
            error: None,
        });

        protocol.write_message(&message, &mut out).unwrap();

        let wire = out.into_inner();
        let (consumed, decoded) = complete(protocol.decode(&wire, 0));
        assert_eq!(consumed, wire.len());
        assert_eq!(decoded.unwrap(), message);
    }

    #[test]
    fn write_message_respects_max_size() {
        let protocol = JsonHubProtocol::with_max_message_size(8);
        let mut out = Cursor::new(Vec::new());
        let err = protocol
            .write_message(&HubMessage::invocation("long-target", vec![]), &mut out)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
        assert!(out.into_inner().is_empty());
    }

    #[test]
    fn write_message_retries_interrupted() {
        let protocol = JsonHubProtocol::new();
        let mut sink = InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        };
        protocol.write_message(&HubMessage::ping(), &mut sink).unwrap();
        assert_eq!(sink.data, b"{\"type\":6}\x1e");
    }

    #[test]
    fn write_message_zero_write_is_connection_closed() {
        let protocol = JsonHubProtocol::new();
        let err = protocol
            .write_message(&HubMessage::ping(), &mut ZeroWriter)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }

    #[test]
    fn write_message_propagates_io_error() {
        let protocol = JsonHubProtocol::new();
        let err = protocol
            .write_message(&HubMessage::ping(), &mut BrokenPipe)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            // Accept a few bytes at a time to exercise the offset loop.
            let n = buf.len().min(3);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
