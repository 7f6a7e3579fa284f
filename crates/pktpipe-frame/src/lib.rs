//! Single-length-byte packet framing for pktpipe.
//!
//! Every packet on the wire is one length byte followed by the payload. The
//! length counts itself, so packets are 1..=255 bytes and payloads 0..=254.
//! No magic, no checksum, no version.
//!
//! [`Sender`] and [`Receiver`] take care of short writes and short reads, so
//! callers only ever see whole packets.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod receiver;
pub mod sender;

pub use buffer::ByteBuffer;
pub use codec::{
    decode_packet, encode_packet, validate_packet, Packet, HEADER_SIZE, MAX_PACKET_LEN,
    MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use receiver::Receiver;
pub use sender::Sender;
