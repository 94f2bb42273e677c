mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "hubconn", version, about = "Hub connection CLI")]
struct Cli {
    /// Output format for received messages.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_invocation() {
        let cli = Cli::try_parse_from([
            "hubconn",
            "send",
            "/tmp/hub.sock",
            "--target",
            "join",
            "--args",
            "[\"room\"]",
            "--close",
            "",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.target.as_deref(), Some("join"));
                assert_eq!(args.close.as_deref(), Some(""));
                assert!(!args.ping);
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn send_requires_target_or_ping() {
        let err = Cli::try_parse_from(["hubconn", "send", "/tmp/hub.sock"])
            .expect_err("send without target or ping should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        Cli::try_parse_from(["hubconn", "send", "/tmp/hub.sock", "--ping"])
            .expect("ping alone should parse");
    }

    #[test]
    fn rejects_target_with_ping() {
        let err = Cli::try_parse_from([
            "hubconn",
            "send",
            "/tmp/hub.sock",
            "--target",
            "m",
            "--ping",
        ])
        .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_listen_with_global_flags() {
        let cli = Cli::try_parse_from([
            "hubconn",
            "listen",
            "/tmp/hub.sock",
            "--count",
            "3",
            "--format",
            "pretty",
            "--log-level",
            "debug",
        ])
        .expect("listen args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.command, Command::Listen(ref args) if args.count == Some(3)));
    }
}
