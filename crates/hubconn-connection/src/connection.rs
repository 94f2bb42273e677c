use std::any::Any;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Buf, BytesMut};
use hubconn_protocol::{Decoded, HubMessage, HubProtocol};
use hubconn_transport::{Transport, TransportWriter};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::sink::{SendErrorSink, TracingSink};
use crate::state::{AtomicState, ConnectionState};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Per-connection session data, keyed by name.
pub type Items = HashMap<String, Box<dyn Any + Send + Sync>>;

/// Accumulation buffer plus the scratch chunk transport reads land in.
struct ReadState {
    buf: BytesMut,
    // Prefix of `buf` the protocol already searched without finding a message.
    scanned: usize,
    chunk: Box<[u8]>,
}

/// One logical hub connection over a transport and a wire protocol.
///
/// `start`, `is_connected`, `close` and the send methods take `&self` and may
/// be called from any thread, including while another thread is blocked in
/// [`receive`](Self::receive). Sends are not ordered against each other;
/// callers that need strict ordering across threads must serialize them.
///
/// The connection never closes the transport. Dropping the transport (or
/// every `Arc` to it) is the owner's job.
pub struct HubConnection<T, P> {
    transport: T,
    protocol: P,
    state: AtomicState,
    read: Mutex<ReadState>,
    items: Items,
    sink: Arc<dyn SendErrorSink>,
    config: ConnectionConfig,
}

impl<T: Transport, P: HubProtocol> HubConnection<T, P> {
    /// Create a connection with default configuration.
    pub fn new(transport: T, protocol: P) -> Self {
        Self::with_config(transport, protocol, ConnectionConfig::default())
    }

    /// Create a connection with explicit configuration.
    pub fn with_config(transport: T, protocol: P, config: ConnectionConfig) -> Self {
        let chunk_size = config.read_chunk_size.max(1);
        Self {
            transport,
            protocol,
            state: AtomicState::new(),
            read: Mutex::new(ReadState {
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
                scanned: 0,
                chunk: vec![0u8; chunk_size].into_boxed_slice(),
            }),
            items: Items::new(),
            sink: Arc::new(TracingSink),
            config,
        }
    }

    /// Route send failures to `sink` instead of the default [`TracingSink`].
    pub fn with_send_error_sink(mut self, sink: Arc<dyn SendErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Mark the connection started. Only the first call has an effect, and a
    /// closed connection stays closed.
    pub fn start(&self) {
        if self.state.start() {
            debug!(connection_id = self.connection_id(), "hub connection started");
        }
    }

    /// True while started and not yet closed.
    pub fn is_connected(&self) -> bool {
        self.state.load() == ConnectionState::Started
    }

    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Mark the connection closed, then tell the peer.
    ///
    /// The state flips before the Close message is written, so `is_connected`
    /// is already false while the notification is in flight. Delivery is best
    /// effort; calling `close` again sends another Close message.
    pub fn close(&self, reason: &str) {
        let previous = self.state.close();
        debug!(
            connection_id = self.connection_id(),
            ?previous,
            reason,
            "closing hub connection"
        );
        self.send(&HubMessage::close(reason, true));
    }

    /// Identifier of the underlying transport connection.
    pub fn connection_id(&self) -> &str {
        self.transport.connection_id()
    }

    /// Block until one complete inbound message is available.
    ///
    /// Bytes past the returned message stay buffered for the next call. A
    /// transport error or EOF is returned as-is and leaves already buffered
    /// bytes intact. A frame that fails to decode is returned as
    /// [`ConnectionError::Protocol`]; the stream stays usable.
    ///
    /// Single consumer: concurrent callers are serialized on the buffer.
    pub fn receive(&self) -> Result<HubMessage> {
        let mut guard = self.read.lock().unwrap_or_else(PoisonError::into_inner);
        let ReadState { buf, scanned, chunk } = &mut *guard;

        loop {
            match self.protocol.decode(buf, *scanned) {
                Decoded::Complete { consumed, message } => {
                    // A protocol cannot move the cursor past what it was given.
                    buf.advance(consumed.min(buf.len()));
                    *scanned = 0;
                    return message.map_err(ConnectionError::from);
                }
                Decoded::Incomplete { scanned: next } => *scanned = next.min(buf.len()),
            }

            let read = match self.transport.read(chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ConnectionError::Transport(err)),
            };

            if read == 0 {
                return Err(ConnectionError::Closed);
            }

            buf.extend_from_slice(&chunk[..read]);
            trace!(
                connection_id = self.connection_id(),
                read,
                buffered = buf.len(),
                "transport read"
            );
        }
    }

    /// Send a one-way invocation of `target`.
    pub fn send_invocation(&self, target: &str, arguments: Vec<Value>) {
        self.send(&HubMessage::invocation(target, arguments));
    }

    /// Send one item of the stream identified by `invocation_id`.
    pub fn stream_item(&self, invocation_id: &str, item: Value) {
        self.send(&HubMessage::stream_item(invocation_id, item));
    }

    /// Complete the invocation identified by `invocation_id`.
    pub fn completion(&self, invocation_id: &str, result: Option<Value>, error: Option<&str>) {
        self.send(&HubMessage::completion(invocation_id, result, error));
    }

    pub fn ping(&self) {
        self.send(&HubMessage::ping());
    }

    /// Write `message` to the transport. Failures go to the send error sink.
    pub fn send(&self, message: &HubMessage) {
        let mut writer = TransportWriter::new(&self.transport);
        if let Err(err) = self.protocol.write_message(message, &mut writer) {
            self.sink.send_failed(self.connection_id(), message, &err);
        }
    }

    /// Session data attached to this connection.
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Mutable session data. Requires exclusive access to the connection;
    /// callers sharing a connection across threads bring their own lock.
    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.items
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

impl<T: Transport, P: HubProtocol> std::fmt::Debug for HubConnection<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConnection")
            .field("connection_id", &self.connection_id())
            .field("protocol", &self.protocol.name())
            .field("state", &self.state.load())
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}
