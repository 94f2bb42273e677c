#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use hubconn::connection::HubConnection;
use hubconn::protocol::{HubMessage, Invocation, JsonHubProtocol};
use hubconn::transport::{StreamTransport, UnixDomainSocket};
use serde_json::{json, Value};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/hubconn-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_connect(path: &Path, timeout: Duration) -> StreamTransport<std::os::unix::net::UnixStream> {
    let start = Instant::now();
    loop {
        match UnixDomainSocket::connect(path) {
            Ok(transport) => return transport,
            Err(err) => {
                assert!(start.elapsed() < timeout, "connect timeout: {err}");
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

#[test]
fn listen_prints_messages_and_answers() {
    let dir = unique_temp_dir("listen");
    let sock_path = dir.join("hub.sock");

    let child = Command::new(env!("CARGO_BIN_EXE_hubconn"))
        .args(["--log-level", "error", "--format", "json", "listen"])
        .arg(&sock_path)
        .args(["--count", "2"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen command should start");

    let conn = HubConnection::new(
        wait_for_connect(&sock_path, Duration::from_secs(3)),
        JsonHubProtocol::new(),
    );
    conn.start();

    conn.ping();
    assert_eq!(conn.receive().expect("ping reply"), HubMessage::Ping);

    conn.send(&HubMessage::Invocation(Invocation {
        invocation_id: Some("42".to_string()),
        target: "echo".to_string(),
        arguments: vec![json!("hi")],
    }));
    assert_eq!(
        conn.receive().expect("completion reply"),
        HubMessage::completion("42", None, None)
    );

    let output = child.wait_with_output().expect("listen should exit");
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["kind"], "ping");
    assert_eq!(lines[0]["connection_id"], "conn-1");
    assert_eq!(lines[1]["type"], 1);
    assert_eq!(lines[1]["message"]["target"], "echo");
    assert_eq!(lines[1]["message"]["invocationId"], "42");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_delivers_invocation_and_close() {
    let dir = unique_temp_dir("send");
    let sock_path = dir.join("hub.sock");
    let listener = UnixDomainSocket::bind(&sock_path).expect("listener should bind");

    let status = {
        let path = sock_path.clone();
        thread::spawn(move || {
            Command::new(env!("CARGO_BIN_EXE_hubconn"))
                .args(["--log-level", "error", "send"])
                .arg(&path)
                .args(["--target", "join", "--args", r#"["room-1", 2]"#, "--close", "bye"])
                .status()
                .expect("send command should run")
        })
    };

    let conn = HubConnection::new(
        listener.accept().expect("listener should accept"),
        JsonHubProtocol::new(),
    );
    conn.start();
    assert_eq!(
        conn.receive().expect("invocation"),
        HubMessage::invocation("join", vec![json!("room-1"), json!(2)])
    );
    assert_eq!(
        conn.receive().expect("close"),
        HubMessage::close("bye", true)
    );

    let status = status.join().expect("send thread should finish");
    assert!(status.success());

    drop(listener);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn send_rejects_non_array_args() {
    let status = Command::new(env!("CARGO_BIN_EXE_hubconn"))
        .args(["--log-level", "error", "send", "/tmp/hubconn-nonexistent.sock"])
        .args(["--target", "m", "--args", r#"{"x":1}"#])
        .stderr(Stdio::null())
        .status()
        .expect("send command should run");
    assert_eq!(status.code(), Some(64));
}

#[test]
fn version_reports_crate_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_hubconn"))
        .args(["version", "--extended"])
        .output()
        .expect("version command should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("hubconn {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("protocols: json"));
}
