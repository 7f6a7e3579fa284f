/// Errors that can occur while framing, sending or receiving packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A packet must be 1..=255 bytes including its length byte.
    #[error("invalid packet length {len} (expected 1..=255)")]
    InvalidLength { len: usize },

    /// The payload does not fit behind a single length byte.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The length byte disagrees with the number of bytes in the buffer.
    #[error("length byte says {declared} but packet holds {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// A read went past the end of a byte buffer.
    #[error("buffer underflow (wanted {requested} bytes, {available} available)")]
    BufferUnderflow { requested: usize, available: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
