use std::io::{self, ErrorKind, Read, Write};

use crate::address::ChannelAddress;
use crate::error::{is_pending, Result};

/// An opaque duplex byte channel between two processes.
pub trait StreamChannel {
    /// Write some prefix of `buf`, returning how many bytes went out.
    ///
    /// A short write is not an error; callers loop until done.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Block until `buf` is filled, returning the number of bytes read.
    ///
    /// A peer that closes before `buf` is full surfaces as
    /// `ErrorKind::UnexpectedEof`. Implementations may return fewer bytes
    /// than requested (or zero) without error; callers retry.
    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: StreamChannel + ?Sized> StreamChannel for &mut S {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv_exact(buf)
    }
}

impl<S: StreamChannel + ?Sized> StreamChannel for Box<S> {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv_exact(buf)
    }
}

/// Establishes streams for the two roles of a point-to-point channel.
pub trait Transport {
    type Stream: StreamChannel;

    /// Client role: connect to a listener at `address`.
    fn connect(&self, address: &ChannelAddress) -> Result<Self::Stream>;

    /// Server role: listen at `address` and accept exactly one peer.
    fn accept(&self, address: &ChannelAddress) -> Result<Self::Stream>;

    /// Transport name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Fill `buf` from a `Read`, reporting a short stream as `UnexpectedEof`.
pub fn read_exact_counted<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("stream closed after {filled} of {} bytes", buf.len()),
                ))
            }
            Ok(n) => filled += n,
            // Hand back what already arrived; the caller retries for the rest.
            Err(err) if filled > 0 && is_pending(&err) => return Ok(filled),
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// A connected stream produced by [`UnixTransport`](crate::UnixTransport).
#[cfg(unix)]
pub struct IpcStream {
    inner: std::os::unix::net::UnixStream,
}

#[cfg(unix)]
impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(unix)]
impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(unix)]
impl StreamChannel for IpcStream {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_exact_counted(self, buf)
    }
}

#[cfg(unix)]
impl StreamChannel for std::os::unix::net::UnixStream {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_exact_counted(self, buf)
    }
}

#[cfg(unix)]
impl IpcStream {
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self { inner: stream }
    }

    /// A connected pair of streams, mostly useful for loopback tests.
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Shut down both directions, waking a peer blocked in `recv_exact`.
    pub fn shutdown(&self) -> Result<()> {
        self.inner
            .shutdown(std::net::Shutdown::Both)
            .map_err(Into::into)
    }
}

#[cfg(unix)]
impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream").field("type", &"unix").finish()
    }
}
