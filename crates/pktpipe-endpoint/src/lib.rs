//! Point-to-point packet endpoints.
//!
//! An [`Endpoint`] is one side of a channel: it connects (retrying until the
//! peer listens) or accepts a single peer, then sends and receives whole
//! length-prefixed packets. [`SyncEndpoint`] shares one endpoint between
//! threads behind a mutex.
//!
//! ```no_run
//! # #[cfg(unix)]
//! # fn main() -> pktpipe_endpoint::Result<()> {
//! use pktpipe_endpoint::Endpoint;
//! use pktpipe_transport::UnixTransport;
//!
//! let mut client = Endpoint::new(UnixTransport::default());
//! client.connect("vmap", Some(0))?;
//! client.send_payload(b"ping")?;
//! let reply = client.recv_packet();
//! # let _ = reply;
//! # Ok(())
//! # }
//! # #[cfg(not(unix))]
//! # fn main() {}
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod synchronized;

#[cfg(test)]
mod test_support;

pub use config::{EndpointConfig, Establish, RetryInterval, RetryPolicy};
pub use endpoint::{Endpoint, EndpointState};
pub use error::{EndpointError, Result};
pub use synchronized::SyncEndpoint;
