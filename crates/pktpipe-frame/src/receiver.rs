use pktpipe_transport::{
    default_sink, is_end_of_stream, is_pending, ErrorCode, SharedSink, StreamChannel,
};
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::codec::{HEADER_SIZE, MAX_PACKET_LEN};
use crate::error::{FrameError, Result};

/// Reads length-prefixed packets from a [`StreamChannel`].
///
/// Once the stream ends or faults the receiver is at eof for good; later
/// calls return immediately without touching the stream.
pub struct Receiver<T> {
    inner: T,
    staging: [u8; MAX_PACKET_LEN],
    eof: bool,
    sink: SharedSink,
}

impl<T: StreamChannel> Receiver<T> {
    pub fn new(inner: T) -> Self {
        Self::with_sink(inner, default_sink())
    }

    /// Create a receiver that reports faults to `sink`.
    pub fn with_sink(inner: T, sink: SharedSink) -> Self {
        Self {
            inner,
            staging: [0u8; MAX_PACKET_LEN],
            eof: false,
            sink,
        }
    }

    /// Read exactly `size` bytes and append them to `packet`.
    ///
    /// Interrupted or would-block reads are retried, as are reads that
    /// return no data. End of stream and any other error set eof; only the
    /// latter is reported to the sink.
    pub fn recv(&mut self, packet: &mut ByteBuffer, size: usize) -> Result<()> {
        if self.eof {
            return Err(FrameError::ConnectionClosed);
        }
        if size > MAX_PACKET_LEN {
            return Err(FrameError::InvalidLength { len: size });
        }

        let mut filled = 0usize;
        while filled < size {
            match self.inner.recv_exact(&mut self.staging[filled..size]) {
                Ok(0) => {
                    trace!(filled, size, "zero-byte read, yielding");
                    std::thread::yield_now();
                }
                Ok(n) => filled += n.min(size - filled),
                Err(err) if is_end_of_stream(&err) => {
                    self.eof = true;
                    return Err(FrameError::ConnectionClosed);
                }
                Err(err) if is_pending(&err) => continue,
                Err(err) => {
                    self.sink.error(&format!(
                        "recv: failed to recv data from stream because of error {}",
                        ErrorCode::of(&err)
                    ));
                    self.eof = true;
                    return Err(FrameError::Io(err));
                }
            }
        }

        packet.append(&self.staging[..size]);
        Ok(())
    }

    /// Receive one packet, length byte included.
    ///
    /// On failure the bytes read so far are returned (nothing, or the length
    /// byte alone) and [`is_eof`](Self::is_eof) turns true.
    pub fn recv_packet(&mut self) -> ByteBuffer {
        let mut packet = ByteBuffer::with_capacity(MAX_PACKET_LEN);
        let _ = self.fill_packet(&mut packet);
        packet
    }

    /// Receive one packet, surfacing why the stream stopped.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the peer closed the
    /// stream and `Err(FrameError::Io)` on a transport fault.
    pub fn read_packet(&mut self) -> Result<ByteBuffer> {
        let mut packet = ByteBuffer::with_capacity(MAX_PACKET_LEN);
        self.fill_packet(&mut packet)?;
        Ok(packet)
    }

    fn fill_packet(&mut self, packet: &mut ByteBuffer) -> Result<()> {
        self.recv(packet, HEADER_SIZE)?;
        let len = self.staging[0] as usize;
        if len > HEADER_SIZE {
            self.recv(packet, len - HEADER_SIZE)?;
        }
        Ok(())
    }

    /// True once the stream can no longer produce data.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the receiver and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};

    use pktpipe_transport::MemorySink;

    use super::*;
    use crate::codec::{encode_packet, Packet};

    /// Replays scripted read results, then reports end of stream.
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        calls: usize,
    }

    impl ScriptedStream {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                calls: 0,
            }
        }

        fn wire(bytes: &[u8]) -> Self {
            Self::new(vec![Ok(bytes.to_vec())])
        }
    }

    impl StreamChannel for ScriptedStream {
        fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            match self.reads.pop_front() {
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.reads.push_front(Ok(chunk.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Err(err)) => Err(err),
                None => Err(io::Error::from(ErrorKind::UnexpectedEof)),
            }
        }
    }

    #[test]
    fn receives_single_packet() {
        let mut receiver = Receiver::new(ScriptedStream::wire(b"\x06hello"));
        let packet = receiver.recv_packet();
        assert_eq!(packet.as_slice(), b"\x06hello");
        assert!(!receiver.is_eof());
    }

    #[test]
    fn receives_back_to_back_packets() {
        let mut wire = ByteBuffer::new();
        encode_packet(b"one", &mut wire).unwrap();
        encode_packet(b"", &mut wire).unwrap();
        encode_packet(b"three", &mut wire).unwrap();

        let mut receiver = Receiver::new(ScriptedStream::wire(wire.as_slice()));
        let p1 = Packet::from_buffer(&receiver.recv_packet()).unwrap();
        let p2 = Packet::from_buffer(&receiver.recv_packet()).unwrap();
        let p3 = Packet::from_buffer(&receiver.recv_packet()).unwrap();

        assert_eq!(p1.payload.as_ref(), b"one");
        assert!(p2.payload.is_empty());
        assert_eq!(p3.payload.as_ref(), b"three");
    }

    #[test]
    fn length_one_packet_needs_no_further_read() {
        let mut stream = ScriptedStream::wire(&[1]);
        let packet = Receiver::new(&mut stream).recv_packet();
        assert_eq!(packet.as_slice(), &[1]);
        assert_eq!(stream.calls, 1);
    }

    #[test]
    fn closed_before_any_byte_is_empty_and_eof() {
        let sink = MemorySink::new();
        let mut receiver = Receiver::with_sink(ScriptedStream::new(vec![]), sink.clone());

        let packet = receiver.recv_packet();
        assert!(packet.is_empty());
        assert!(receiver.is_eof());
        assert!(sink.is_empty(), "clean close must not be logged");
    }

    #[test]
    fn closed_mid_payload_returns_length_byte_only() {
        let mut receiver = Receiver::new(ScriptedStream::wire(&[10, b'a', b'b']));
        let packet = receiver.recv_packet();
        assert_eq!(packet.as_slice(), &[10]);
        assert!(receiver.is_eof());
    }

    #[test]
    fn read_packet_distinguishes_close_from_fault() {
        let mut closed = Receiver::new(ScriptedStream::new(vec![]));
        assert!(matches!(
            closed.read_packet(),
            Err(FrameError::ConnectionClosed)
        ));

        let sink = MemorySink::new();
        let mut faulted = Receiver::with_sink(
            ScriptedStream::new(vec![Err(io::Error::from_raw_os_error(104))]),
            sink.clone(),
        );
        assert!(matches!(faulted.read_packet(), Err(FrameError::Io(_))));
        assert!(faulted.is_eof());
        assert_eq!(
            sink.lines(),
            vec!["recv: failed to recv data from stream because of error 104"]
        );
    }

    #[test]
    fn pending_and_zero_reads_are_retried() {
        let stream = ScriptedStream::new(vec![
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(vec![4]),
            Ok(Vec::new()),
            Err(io::Error::from(ErrorKind::WouldBlock)),
            Ok(b"ab".to_vec()),
            Ok(b"c".to_vec()),
        ]);
        let sink = MemorySink::new();
        let mut receiver = Receiver::with_sink(stream, sink.clone());

        let packet = receiver.read_packet().unwrap();
        assert_eq!(packet.as_slice(), b"\x04abc");
        assert!(sink.is_empty());
        assert_eq!(receiver.get_ref().calls, 6);
    }

    #[test]
    fn eof_is_sticky() {
        let mut receiver = Receiver::new(ScriptedStream::new(vec![
            Err(io::Error::from(ErrorKind::BrokenPipe)),
            Ok(b"\x02z".to_vec()),
        ]));
        assert!(receiver.recv_packet().is_empty());
        assert!(receiver.is_eof());

        assert!(receiver.recv_packet().is_empty());
        assert_eq!(receiver.get_ref().calls, 1);
    }

    #[test]
    fn recv_rejects_oversized_request() {
        let mut receiver = Receiver::new(ScriptedStream::new(vec![]));
        let mut packet = ByteBuffer::new();
        let err = receiver.recv(&mut packet, MAX_PACKET_LEN + 1).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { len: 256 }));
        assert!(!receiver.is_eof());
    }

    #[cfg(unix)]
    #[test]
    fn full_size_packet_over_socket_pair() {
        use std::io::Write;

        let (mut left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let payload = [0xABu8; crate::codec::MAX_PAYLOAD];
        let mut wire = ByteBuffer::new();
        encode_packet(&payload, &mut wire).unwrap();
        left.write_all(wire.as_slice()).unwrap();

        let mut receiver = Receiver::new(right);
        let packet = receiver.recv_packet();
        assert_eq!(packet.size(), MAX_PACKET_LEN);
        assert_eq!(&packet.as_slice()[1..], &payload[..]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut receiver = Receiver::new(ScriptedStream::new(vec![]));
        let _ = receiver.get_ref();
        let _ = receiver.get_mut();
        let _inner = receiver.into_inner();
    }
}
