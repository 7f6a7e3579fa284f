//! Length-prefixed packets over point-to-point local streams.
//!
//! pktpipe connects exactly two processes over a named local channel and
//! moves whole packets between them: one length byte, then up to 254 payload
//! bytes. The client side retries until the server listens; the server
//! accepts a single peer.
//!
//! # Crate Structure
//!
//! - [`transport`]: stream channels, addresses, error sinks, Unix sockets
//! - [`frame`]: packet codec, byte buffer, sender and receiver
//! - [`endpoint`]: connect/accept endpoints and the synchronized wrapper
//!   (behind the `endpoint` feature)

/// Re-export transport types.
pub mod transport {
    pub use pktpipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pktpipe_frame::*;
}

/// Re-export endpoint types (requires `endpoint` feature).
#[cfg(feature = "endpoint")]
pub mod endpoint {
    pub use pktpipe_endpoint::*;
}
