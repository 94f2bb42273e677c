//! Hub connection lifecycle, message framing and outbound sends.
//!
//! [`HubConnection`] sits between a [`Transport`](hubconn_transport::Transport)
//! and a [`HubProtocol`](hubconn_protocol::HubProtocol). It reassembles
//! inbound messages from however the bytes arrive, sends the outbound
//! message kinds fire-and-forget, and tracks whether the connection is live.

pub mod config;
pub mod connection;
pub mod error;
pub mod sink;
pub mod state;

pub use config::{ConnectionConfig, DEFAULT_READ_CHUNK_SIZE};
pub use connection::{HubConnection, Items};
pub use error::{ConnectionError, Result};
pub use sink::{SendErrorSink, TracingSink};
pub use state::ConnectionState;
