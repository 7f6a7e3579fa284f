#[cfg(unix)]
mod cmd;
mod exit;
mod logging;
#[cfg(unix)]
mod output;

#[cfg(unix)]
use std::path::PathBuf;

#[cfg(unix)]
use clap::Parser;

#[cfg(unix)]
use crate::cmd::{Command, Context};
#[cfg(unix)]
use crate::logging::{init_logging, LogFormat, LogLevel};
#[cfg(unix)]
use crate::output::OutputFormat;

#[cfg(unix)]
#[derive(Parser, Debug)]
#[command(name = "pktpipe", version, about = "Point-to-point packet pipe CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Directory holding channel sockets. Defaults to the system temp dir.
    #[arg(long, value_name = "DIR", env = "PKTPIPE_SOCKET_DIR", global = true)]
    socket_dir: Option<PathBuf>,

    /// Octal permission mode for sockets created by `listen` and `echo`.
    #[arg(
        long,
        value_name = "MODE",
        default_value = "600",
        value_parser = cmd::parse_socket_mode,
        global = true
    )]
    socket_mode: u32,

    #[command(subcommand)]
    command: Command,
}

#[cfg(unix)]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let ctx = Context {
        format: cli.format.unwrap_or_else(OutputFormat::default_for_stdout),
        socket_dir: cli.socket_dir.unwrap_or_else(std::env::temp_dir),
        socket_mode: cli.socket_mode,
    };
    let result = cmd::run(cli.command, &ctx);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(not(unix))]
fn main() {
    logging::init_logging(logging::LogFormat::Text, logging::LogLevel::Error);
    eprintln!("error: pktpipe needs Unix domain sockets, which this platform lacks");
    std::process::exit(exit::USAGE);
}
