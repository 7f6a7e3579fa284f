use pktpipe_transport::ChannelAddress;

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pktpipe_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pktpipe_frame::FrameError),

    /// The operation needs a connected endpoint.
    #[error("endpoint not connected")]
    NotConnected,

    /// A bounded retry policy ran out of attempts.
    #[error("gave up on {address} after {attempts} attempts")]
    RetriesExhausted {
        address: ChannelAddress,
        attempts: u32,
    },
}

pub type Result<T> = std::result::Result<T, EndpointError>;
