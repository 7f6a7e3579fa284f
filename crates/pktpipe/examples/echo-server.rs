//! Minimal echo server: accepts one peer and echoes packets back.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --features cli -- --socket-dir /tmp/pktpipe-echo-example \
//!     send echo --data hello --wait

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;

    use pktpipe::endpoint::Endpoint;
    use pktpipe::transport::UnixTransport;

    let sock_dir = std::env::temp_dir().join("pktpipe-echo-example");
    fs::create_dir_all(&sock_dir)?;

    let transport = UnixTransport::new(&sock_dir);
    eprintln!("Listening in {}", sock_dir.display());

    let mut endpoint = Endpoint::new(transport);
    endpoint.accept("echo", None)?;
    eprintln!("Peer connected");

    loop {
        match endpoint.read_packet() {
            Ok(mut packet) => {
                eprintln!("Received {} byte packet", packet.size());
                endpoint.send_packet(&mut packet)?;
            }
            Err(e) => {
                eprintln!("Peer disconnected: {e}");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("echo-server needs Unix domain sockets");
}
