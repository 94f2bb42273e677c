use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hubconn_connection::{HubConnection, SendErrorSink, TracingSink};
use hubconn_protocol::{HubMessage, JsonHubProtocol, ProtocolError};
use hubconn_transport::UnixDomainSocket;
use serde_json::Value;

use crate::cmd::SendArgs;
use crate::exit::{transport_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let arguments = parse_arguments(&args.args)?;
    let transport =
        UnixDomainSocket::connect(&args.path).map_err(|err| transport_error("connect failed", err))?;
    let failed = Arc::new(AtomicBool::new(false));
    let sink = {
        let failed = Arc::clone(&failed);
        move |id: &str, message: &HubMessage, err: &ProtocolError| {
            failed.store(true, Ordering::SeqCst);
            TracingSink.send_failed(id, message, err);
        }
    };
    let conn = HubConnection::new(transport, JsonHubProtocol::new())
        .with_send_error_sink(Arc::new(sink));
    conn.start();

    match &args.target {
        Some(target) if !args.ping => conn.send_invocation(target, arguments),
        _ => conn.ping(),
    }

    if let Some(reason) = &args.close {
        conn.close(reason);
    }

    if failed.load(Ordering::SeqCst) {
        return Err(CliError::new(FAILURE, "send failed: message was not delivered"));
    }
    Ok(SUCCESS)
}

fn parse_arguments(input: &str) -> CliResult<Vec<Value>> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(other) => Err(CliError::new(
            USAGE,
            format!("--args must be a JSON array, got {other}"),
        )),
        Err(err) => Err(CliError::new(USAGE, format!("--args is not valid JSON: {err}"))),
    }
}
