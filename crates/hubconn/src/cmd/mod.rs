use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind a socket and print received hub messages.
    Listen(ListenArgs),
    /// Connect and send one invocation or ping.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Hub method to invoke.
    #[arg(long, short = 't', required_unless_present = "ping", conflicts_with = "ping")]
    pub target: Option<String>,
    /// Invocation arguments as a JSON array.
    #[arg(long, default_value = "[]", requires = "target")]
    pub args: String,
    /// Send a ping instead of an invocation.
    #[arg(long)]
    pub ping: bool,
    /// Close the connection afterwards with this reason (may be empty).
    #[arg(long, value_name = "REASON")]
    pub close: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
