use clap::{Args, Subcommand};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pktpipe_endpoint::{Endpoint, EndpointError};
use pktpipe_frame::FrameError;
use pktpipe_transport::{ChannelAddress, UnixTransport};

use crate::exit::{endpoint_error, CliError, CliResult, INTERNAL, INTERRUPTED};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one peer at a time and echo its packets back.
    Echo(EchoArgs),
    /// Connect and send a single packet.
    Send(SendArgs),
    /// Accept peers and print received packets.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub socket_dir: PathBuf,
    pub socket_mode: u32,
}

impl Context {
    pub fn transport(&self) -> UnixTransport {
        UnixTransport::new(&self.socket_dir).with_socket_mode(self.socket_mode)
    }

    /// A fresh endpoint over Unix sockets in the configured directory.
    pub fn endpoint(&self) -> Endpoint<UnixTransport> {
        Endpoint::new(self.transport())
    }
}

/// Parse an octal permission mode such as `600` or `0o660`.
pub fn parse_socket_mode(input: &str) -> Result<u32, String> {
    let digits = input.strip_prefix("0o").unwrap_or(input);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| format!("invalid octal mode: {input}"))?;
    if mode > 0o777 {
        return Err(format!("mode out of range: {input}"));
    }
    Ok(mode)
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Listen(args) => listen::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

/// What a server loop does after a failed receive.
pub enum RecvDisposition {
    /// The peer closed its side; wait for the next one.
    PeerClosed,
    Fatal(CliError),
}

pub fn classify_recv_error(err: EndpointError) -> RecvDisposition {
    match err {
        EndpointError::Frame(FrameError::ConnectionClosed) => RecvDisposition::PeerClosed,
        other => RecvDisposition::Fatal(endpoint_error("receive failed", other)),
    }
}

/// Install the Ctrl-C handler for a server loop listening at `address`.
///
/// The handler clears `running` and then connects to the server's own
/// socket, which wakes a blocked accept so the loop can observe the flag.
/// When nothing is listening (a peer session is in progress, or bind has
/// not happened yet) there is no call to wake and the process exits with
/// `INTERRUPTED`.
pub fn install_ctrlc_handler(
    running: Arc<AtomicBool>,
    ctx: &Context,
    address: &ChannelAddress,
) -> CliResult<()> {
    let wake_path = ctx.transport().socket_path(address);
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        if UnixStream::connect(&wake_path).is_err() {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// Channel name.
    pub name: String,
    /// Numeric id; the effective channel becomes `<name>_<id>`.
    #[arg(long)]
    pub id: Option<u32>,
}

impl ChannelArgs {
    pub fn address(&self) -> ChannelAddress {
        ChannelAddress::resolve(&self.name, self.id)
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Exit after the first peer disconnects.
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Wait for one reply packet and print it.
    #[arg(long)]
    pub wait: bool,
    /// Give up after N connect attempts (default: retry until the peer listens).
    #[arg(long, value_name = "N")]
    pub connect_attempts: Option<u32>,
    /// Delay between connect attempts (e.g. 50ms, 1s).
    #[arg(long, default_value = "50ms")]
    pub retry_interval: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
