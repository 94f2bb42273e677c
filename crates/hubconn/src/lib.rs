//! Connection-level message layer for real-time hub RPC protocols.
//!
//! hubconn turns a duplex byte stream into discrete hub messages
//! (invocations, stream items, completions, pings, close notifications) and
//! back, and tracks the lifecycle of one logical connection.
//!
//! # Crate Structure
//!
//! - [`transport`]: duplex byte-stream abstraction (Unix sockets, TCP)
//! - [`protocol`]: message model and wire protocols (JSON)
//! - [`connection`]: message framing, outbound sends and connection state
//!
//! # Example
//!
//! ```no_run
//! use hubconn::connection::HubConnection;
//! use hubconn::protocol::{HubMessage, JsonHubProtocol};
//! use hubconn::transport::UnixDomainSocket;
//!
//! let listener = UnixDomainSocket::bind("/tmp/hub.sock")?;
//! let conn = HubConnection::new(listener.accept()?, JsonHubProtocol::new());
//! conn.start();
//! while let Ok(message) = conn.receive() {
//!     if message == HubMessage::Ping {
//!         conn.ping();
//!     }
//! }
//! conn.close("");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use hubconn_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use hubconn_protocol::*;
}

/// Re-export connection types.
pub mod connection {
    pub use hubconn_connection::*;
}
