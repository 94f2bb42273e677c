//! Minimal hub server: accepts one connection and completes every invocation
//! with its first argument.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- send /tmp/hubconn-echo-<pid>/echo.sock \
//!     --target echo --args '["hello"]' --close ""

use std::fs;

use hubconn::connection::{ConnectionError, HubConnection};
use hubconn::protocol::{HubMessage, JsonHubProtocol};
use hubconn::transport::UnixDomainSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join(format!("hubconn-echo-{}", std::process::id()));
    fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("echo.sock");

    let listener = UnixDomainSocket::bind(&sock_path)?;
    eprintln!("Listening on {}", sock_path.display());

    let conn = HubConnection::new(listener.accept()?, JsonHubProtocol::new());
    conn.start();
    eprintln!("Connection accepted: {}", conn.connection_id());

    loop {
        match conn.receive() {
            Ok(HubMessage::Invocation(inv)) => {
                eprintln!("{}({} args)", inv.target, inv.arguments.len());
                match inv.invocation_id {
                    Some(id) => conn.completion(&id, inv.arguments.into_iter().next(), None),
                    None => conn.send_invocation(&inv.target, inv.arguments),
                }
            }
            Ok(HubMessage::Ping) => conn.ping(),
            Ok(HubMessage::Close(close)) => {
                eprintln!("Peer closed: {:?}", close.error);
                break;
            }
            Ok(other) => eprintln!("Ignoring {}", other.kind()),
            Err(ConnectionError::Closed) => break,
            Err(e) => {
                eprintln!("Connection failed: {e}");
                break;
            }
        }
    }

    conn.close("");
    drop(listener);
    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
