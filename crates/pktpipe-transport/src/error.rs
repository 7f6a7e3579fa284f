use std::fmt;
use std::io::{self, ErrorKind};
use std::path::PathBuf;

use crate::address::ChannelAddress;

/// Errors that can occur in stream transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind a listener to the resolved address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: io::Error,
    },

    /// Failed to connect to the resolved address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: ChannelAddress,
        source: io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept on {address}: {source}")]
    Accept {
        address: ChannelAddress,
        source: io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

impl TransportError {
    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Bind { source, .. }
            | Self::Connect { source, .. }
            | Self::Accept { source, .. }
            | Self::Io(source) => Some(source),
            Self::PathTooLong { .. } => None,
        }
    }

    /// Displayable OS error code for log lines.
    pub fn code(&self) -> ErrorCode<'_> {
        ErrorCode(self.io_error())
    }

    /// True when the peer has simply not started listening yet.
    pub fn is_listener_absent(&self) -> bool {
        match self {
            Self::Connect { source, .. } => is_listener_absent(source),
            _ => false,
        }
    }

    /// True for errors worth retrying without caller involvement.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { source, .. } => is_listener_absent(source) || is_pending(source),
            Self::Accept { source, .. } | Self::Io(source) => is_pending(source),
            Self::Bind { .. } | Self::PathTooLong { .. } => false,
        }
    }
}

/// Renders the raw OS error number when there is one, the error kind otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCode<'a>(Option<&'a io::Error>);

impl<'a> ErrorCode<'a> {
    pub fn of(err: &'a io::Error) -> Self {
        Self(Some(err))
    }
}

impl fmt::Display for ErrorCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(err) => match err.raw_os_error() {
                Some(code) => write!(f, "{code}"),
                None => write!(f, "{:?}", err.kind()),
            },
            None => f.write_str("none"),
        }
    }
}

/// The connect target does not exist yet, or exists without a listener.
pub fn is_listener_absent(err: &io::Error) -> bool {
    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        return code == libc::ENOENT || code == libc::ECONNREFUSED;
    }
    matches!(
        err.kind(),
        ErrorKind::NotFound | ErrorKind::ConnectionRefused
    )
}

/// The peer closed its side of the stream.
pub fn is_end_of_stream(err: &io::Error) -> bool {
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::EPIPE) {
        return true;
    }
    matches!(err.kind(), ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe)
}

/// The call was cut short but more data is expected; retry the same call.
pub fn is_pending(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

pub type Result<T> = std::result::Result<T, TransportError>;
