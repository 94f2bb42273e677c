use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hubconn_protocol::HubMessage;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    connection_id: &'a str,
    kind: &'static str,
    #[serde(rename = "type")]
    type_id: u8,
    message: &'a HubMessage,
    timestamp: String,
}

pub fn print_message(message: &HubMessage, connection_id: &str, format: OutputFormat) {
    println!("{}", render_message(message, connection_id, format));
}

pub fn render_message(message: &HubMessage, connection_id: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                connection_id,
                kind: message.kind().name(),
                type_id: message.kind().as_u8(),
                message,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CONNECTION", "TYPE", "INVOCATION", "BODY"])
                .add_row(vec![
                    connection_id.to_string(),
                    format!("{} ({})", message.kind(), message.kind().as_u8()),
                    message.invocation_id().unwrap_or("-").to_string(),
                    body_preview(message),
                ]);
            table.to_string()
        }
        OutputFormat::Pretty => format!(
            "conn={} type={} ({}) invocation={} body={}",
            connection_id,
            message.kind(),
            message.kind().as_u8(),
            message.invocation_id().unwrap_or("-"),
            body_preview(message)
        ),
    }
}

fn body_preview(message: &HubMessage) -> String {
    match message {
        HubMessage::Invocation(inv) => format!("{}({})", inv.target, join_values(&inv.arguments)),
        HubMessage::StreamInvocation(inv) => {
            format!("{}({})", inv.target, join_values(&inv.arguments))
        }
        HubMessage::StreamItem(item) => item.item.to_string(),
        HubMessage::Completion(done) => match (&done.error, &done.result) {
            (Some(error), _) => format!("error: {error}"),
            (None, Some(result)) => result.to_string(),
            (None, None) => "-".to_string(),
        },
        HubMessage::CancelInvocation(_) | HubMessage::Ping => "-".to_string(),
        HubMessage::Close(close) => format!(
            "{} (allow_reconnect={})",
            close.error.as_deref().unwrap_or("normal"),
            close.allow_reconnect
        ),
    }
}

fn join_values(values: &[serde_json::Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_output_embeds_wire_message() {
        let message = HubMessage::invocation("m", vec![json!(1), json!(2)]);
        let line = render_message(&message, "conn-1", OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["connection_id"], "conn-1");
        assert_eq!(value["kind"], "invocation");
        assert_eq!(value["type"], 1);
        assert_eq!(
            value["message"],
            json!({"type": 1, "target": "m", "arguments": [1, 2]})
        );
    }

    #[test]
    fn pretty_output_summarizes_body() {
        let message = HubMessage::completion("7", None, Some("failed"));
        let line = render_message(&message, "conn-2", OutputFormat::Pretty);
        assert_eq!(
            line,
            "conn=conn-2 type=completion (3) invocation=7 body=error: failed"
        );
    }

    #[test]
    fn table_output_has_header_and_row() {
        let rendered = render_message(&HubMessage::close("bye", true), "c", OutputFormat::Table);
        assert!(rendered.contains("CONNECTION"));
        assert!(rendered.contains("bye (allow_reconnect=true)"));
    }
}
