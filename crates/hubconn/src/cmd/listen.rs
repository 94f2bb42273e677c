use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hubconn_connection::{ConnectionError, HubConnection};
use hubconn_protocol::{HubMessage, HubProtocol, JsonHubProtocol};
use hubconn_transport::{Transport, UnixDomainSocket};
use tracing::{debug, warn};

use crate::cmd::ListenArgs;
use crate::exit::{connection_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener =
        UnixDomainSocket::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    let protocol = Arc::new(JsonHubProtocol::new());

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let transport = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        let conn = HubConnection::new(transport, Arc::clone(&protocol));
        conn.start();

        while running.load(Ordering::SeqCst) {
            let message = match conn.receive() {
                Ok(message) => message,
                Err(ConnectionError::Closed) => break,
                Err(ConnectionError::Protocol(err)) => {
                    warn!(connection_id = conn.connection_id(), error = %err, "skipping undecodable message");
                    continue;
                }
                Err(err) => return Err(connection_error("receive failed", err)),
            };

            print_message(&message, conn.connection_id(), format);
            printed = printed.saturating_add(1);

            if matches!(message, HubMessage::Close(_)) {
                debug!(connection_id = conn.connection_id(), "peer closed");
                break;
            }
            respond(&conn, &message);

            if let Some(count) = args.count {
                if printed >= count {
                    conn.close("");
                    return Ok(SUCCESS);
                }
            }
        }
        conn.close("");
    }

    Ok(SUCCESS)
}

/// Answer pings, and invocations that expect a result.
fn respond<T: Transport, P: HubProtocol>(conn: &HubConnection<T, P>, message: &HubMessage) {
    match message {
        HubMessage::Ping => conn.ping(),
        HubMessage::Invocation(_) | HubMessage::StreamInvocation(_) => {
            if let Some(id) = message.invocation_id() {
                conn.completion(id, None, None);
            }
        }
        _ => {}
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
