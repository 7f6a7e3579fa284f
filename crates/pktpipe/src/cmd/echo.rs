use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cmd::{classify_recv_error, install_ctrlc_handler, Context, EchoArgs, RecvDisposition};
use crate::exit::{endpoint_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs, ctx: &Context) -> CliResult<i32> {
    let address = args.channel.address();
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), ctx, &address)?;
    tracing::debug!(socket_dir = %ctx.transport().socket_dir().display(), %address, "serving");

    while running.load(Ordering::SeqCst) {
        let mut endpoint = ctx.endpoint();
        endpoint
            .accept(&args.channel.name, args.channel.id)
            .map_err(|err| endpoint_error("accept failed", err))?;
        tracing::info!(%address, "peer connected");

        while running.load(Ordering::SeqCst) {
            let mut packet = match endpoint.read_packet() {
                Ok(packet) => packet,
                Err(err) => match classify_recv_error(err) {
                    RecvDisposition::PeerClosed => break,
                    RecvDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };

            tracing::info!(%address, length = packet.size(), "echoing packet");

            endpoint
                .send_packet(&mut packet)
                .map_err(|err| endpoint_error("echo send failed", err))?;
        }
        tracing::info!(%address, "peer disconnected");

        if args.once {
            break;
        }
    }

    Ok(SUCCESS)
}
