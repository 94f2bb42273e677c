use hubconn_protocol::ProtocolError;

/// Errors returned from [`HubConnection::receive`](crate::HubConnection::receive).
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The transport read failed. The connection should be torn down.
    #[error("transport read failed: {0}")]
    Transport(#[from] std::io::Error),

    /// The peer closed the stream (read returned zero bytes).
    #[error("connection closed by peer")]
    Closed,

    /// A complete frame arrived but could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
