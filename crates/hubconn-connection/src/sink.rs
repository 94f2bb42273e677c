use hubconn_protocol::{HubMessage, ProtocolError};
use tracing::warn;

/// Receives outbound messages that could not be sent.
///
/// Sends on a hub connection never return errors to the caller; failures are
/// handed to the connection's sink instead.
pub trait SendErrorSink: Send + Sync {
    fn send_failed(&self, connection_id: &str, message: &HubMessage, error: &ProtocolError);
}

impl<F> SendErrorSink for F
where
    F: Fn(&str, &HubMessage, &ProtocolError) + Send + Sync,
{
    fn send_failed(&self, connection_id: &str, message: &HubMessage, error: &ProtocolError) {
        self(connection_id, message, error)
    }
}

/// Default sink: logs the failure at `warn` level and drops the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl SendErrorSink for TracingSink {
    fn send_failed(&self, connection_id: &str, message: &HubMessage, error: &ProtocolError) {
        warn!(
            connection_id,
            kind = %message.kind(),
            invocation_id = message.invocation_id(),
            error = %error,
            "cannot send message over connection"
        );
    }
}
