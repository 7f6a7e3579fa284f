use pktpipe_transport::{default_sink, is_pending, ErrorCode, SharedSink, StreamChannel};
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::codec::{validate_packet, MAX_PACKET_LEN};
use crate::error::{FrameError, Result};

/// Writes complete packets to a [`StreamChannel`].
pub struct Sender<T> {
    inner: T,
    sink: SharedSink,
}

impl<T: StreamChannel> Sender<T> {
    pub fn new(inner: T) -> Self {
        Self::with_sink(inner, default_sink())
    }

    /// Create a sender that reports faults to `sink`.
    pub fn with_sink(inner: T, sink: SharedSink) -> Self {
        Self { inner, sink }
    }

    /// Write one fully formed packet (length byte already in place).
    ///
    /// The packet is copied out of `packet` first and its read cursor is left
    /// at 0, so the caller can reuse or resend the buffer. Short writes are
    /// continued until every byte is out.
    pub fn send_packet(&mut self, packet: &mut ByteBuffer) -> Result<()> {
        let len = packet.size();
        let mut scratch = [0u8; MAX_PACKET_LEN];
        let staged = stage(packet, &mut scratch);
        packet.set_rpos(0);
        if let Err(err) = staged {
            self.sink
                .error(&format!("SendPacket: refusing malformed packet: {err}"));
            return Err(err);
        }

        let mut offset = 0usize;
        while offset < len {
            match self.inner.send(&scratch[offset..len]) {
                Ok(0) => {
                    self.sink.error(&format!(
                        "SendPacket: stream closed after {offset} of {len} bytes"
                    ));
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => {
                    offset += n.min(len - offset);
                    trace!(offset, len, "packet bytes written");
                }
                Err(err) if is_pending(&err) => continue,
                Err(err) => {
                    self.sink.error(&format!(
                        "SendPacket: failed to send data to stream because of error {}",
                        ErrorCode::of(&err)
                    ));
                    return Err(FrameError::Io(err));
                }
            }
        }
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the sender and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn stage(packet: &mut ByteBuffer, scratch: &mut [u8; MAX_PACKET_LEN]) -> Result<()> {
    let len = packet.size();
    if len == 0 || len > MAX_PACKET_LEN {
        return Err(FrameError::InvalidLength { len });
    }
    packet.set_rpos(0);
    packet.read(&mut scratch[..len])?;
    validate_packet(&scratch[..len])
}
