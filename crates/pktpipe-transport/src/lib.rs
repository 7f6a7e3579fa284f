//! Point-to-point stream transport for pktpipe.
//!
//! This is the lowest layer. It provides:
//! - [`StreamChannel`], the duplex byte channel everything else writes to
//! - [`Transport`], which establishes a channel in the client or server role
//! - [`UnixTransport`], the Unix domain socket implementation
//! - [`ChannelAddress`], name + optional id resolution
//! - [`ErrorSink`], the injected error reporting capability

pub mod address;
pub mod error;
pub mod sink;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use address::{resolve, ChannelAddress};
pub use error::{
    is_end_of_stream, is_listener_absent, is_pending, ErrorCode, Result, TransportError,
};
pub use sink::{default_sink, ErrorSink, MemorySink, SharedSink, TracingSink};
pub use traits::{read_exact_counted, StreamChannel, Transport};

#[cfg(unix)]
pub use traits::IpcStream;
#[cfg(unix)]
pub use uds::{UnixDomainSocket, UnixTransport};
