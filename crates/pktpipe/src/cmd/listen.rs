use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pktpipe_frame::Packet;

use crate::cmd::{classify_recv_error, install_ctrlc_handler, Context, ListenArgs, RecvDisposition};
use crate::exit::{endpoint_error, frame_error, CliResult, SUCCESS};
use crate::output::print_packet;

pub fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let address = args.channel.address();
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), ctx, &address)?;
    tracing::debug!(socket_dir = %ctx.transport().socket_dir().display(), %address, "serving");
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut endpoint = ctx.endpoint();
        endpoint
            .accept(&args.channel.name, args.channel.id)
            .map_err(|err| endpoint_error("accept failed", err))?;
        tracing::info!(%address, "peer connected");

        while running.load(Ordering::SeqCst) {
            let buffer = match endpoint.read_packet() {
                Ok(buffer) => buffer,
                Err(err) => match classify_recv_error(err) {
                    RecvDisposition::PeerClosed => break,
                    RecvDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };
            let packet =
                Packet::from_buffer(&buffer).map_err(|err| frame_error("receive failed", err))?;

            print_packet(&packet, address.as_str(), ctx.format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
        tracing::info!(%address, "peer disconnected");
    }

    Ok(SUCCESS)
}
