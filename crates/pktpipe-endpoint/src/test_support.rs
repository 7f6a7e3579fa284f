//! Transport and stream doubles shared by the endpoint tests.

use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pktpipe_transport::{ChannelAddress, StreamChannel, Transport, TransportError};

/// Outcome of one scripted establishment attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// Peer not there yet (transient).
    Absent,
    /// Hard failure with the given OS error code.
    Fail(i32),
    /// Success.
    Ready,
}

/// Counts live streams so tests can spot leaked handles.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self(live.clone())
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory stream: writes land in a shared log at most `chunk` bytes per
/// call, reads drain a fixed inbound script and then report end of stream.
pub(crate) struct MockStream {
    written: Arc<Mutex<Vec<u8>>>,
    inbound: VecDeque<u8>,
    chunk: usize,
    _live: LiveGuard,
}

impl StreamChannel for MockStream {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk);
        self.written
            .lock()
            .map_err(|_| io::Error::other("write log poisoned"))?
            .extend_from_slice(&buf[..n]);
        std::thread::yield_now();
        Ok(n)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.inbound.is_empty() {
            return Err(io::Error::from(ErrorKind::UnexpectedEof));
        }
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Transport that replays a script of establishment outcomes.
///
/// Once the script runs out every attempt succeeds. `live` counts streams
/// still alive, whether held by an endpoint or anywhere else.
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    pub connects: AtomicUsize,
    pub accepts: AtomicUsize,
    pub live: Arc<AtomicUsize>,
    pub written: Arc<Mutex<Vec<u8>>>,
    inbound: Vec<u8>,
    chunk: usize,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            connects: AtomicUsize::new(0),
            accepts: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            written: Arc::new(Mutex::new(Vec::new())),
            inbound: Vec::new(),
            chunk: usize::MAX,
        }
    }

    /// Bytes every established stream will yield to reads.
    pub fn with_inbound(mut self, inbound: Vec<u8>) -> Self {
        self.inbound = inbound;
        self
    }

    /// Cap on bytes accepted per write.
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .map(|mut steps| steps.pop_front().unwrap_or(Step::Ready))
            .unwrap_or(Step::Ready)
    }

    fn stream(&self) -> MockStream {
        MockStream {
            written: self.written.clone(),
            inbound: self.inbound.iter().copied().collect(),
            chunk: self.chunk,
            _live: LiveGuard::new(&self.live),
        }
    }
}

impl Transport for ScriptedTransport {
    type Stream = MockStream;

    fn connect(&self, address: &ChannelAddress) -> pktpipe_transport::Result<MockStream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let source = match self.next_step() {
            Step::Ready => return Ok(self.stream()),
            Step::Absent => io::Error::from(ErrorKind::NotFound),
            Step::Fail(code) => io::Error::from_raw_os_error(code),
        };
        Err(TransportError::Connect {
            address: address.clone(),
            source,
        })
    }

    fn accept(&self, address: &ChannelAddress) -> pktpipe_transport::Result<MockStream> {
        self.accepts.fetch_add(1, Ordering::SeqCst);
        let stream = self.stream();
        let source = match self.next_step() {
            Step::Ready => return Ok(stream),
            Step::Absent => io::Error::from(ErrorKind::Interrupted),
            Step::Fail(code) => io::Error::from_raw_os_error(code),
        };
        drop(stream);
        Err(TransportError::Accept {
            address: address.clone(),
            source,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
