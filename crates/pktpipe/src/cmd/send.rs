use std::fs;
use std::time::Duration;

use pktpipe_endpoint::{EndpointConfig, Establish, RetryInterval, RetryPolicy};
use pktpipe_frame::{encode_packet, ByteBuffer, Packet, MAX_PACKET_LEN};

use crate::cmd::{Context, SendArgs};
use crate::exit::{endpoint_error, frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::print_packet;

pub fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let mut packet = ByteBuffer::with_capacity(MAX_PACKET_LEN);
    encode_packet(&payload, &mut packet).map_err(|err| frame_error("invalid payload", err))?;

    let config = EndpointConfig {
        connect: Establish::RetryUntilReady(retry_policy(&args)?),
        ..EndpointConfig::default()
    };
    let mut endpoint = ctx.endpoint().with_config(config);
    endpoint
        .connect(&args.channel.name, args.channel.id)
        .map_err(|err| endpoint_error("connect failed", err))?;

    endpoint
        .send_packet(&mut packet)
        .map_err(|err| endpoint_error("send failed", err))?;
    tracing::debug!(address = %args.channel.address(), size = payload.len(), "packet sent");

    if args.wait {
        let reply = endpoint
            .read_packet()
            .map_err(|err| endpoint_error("receive failed", err))?;
        let reply = Packet::from_buffer(&reply).map_err(|err| frame_error("receive failed", err))?;
        print_packet(&reply, args.channel.address().as_str(), ctx.format);
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

fn retry_policy(args: &SendArgs) -> CliResult<RetryPolicy> {
    if args.connect_attempts == Some(0) {
        return Err(CliError::new(USAGE, "--connect-attempts must be at least 1"));
    }
    Ok(RetryPolicy {
        interval: RetryInterval::Fixed(parse_duration(&args.retry_interval)?),
        max_attempts: args.connect_attempts,
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
