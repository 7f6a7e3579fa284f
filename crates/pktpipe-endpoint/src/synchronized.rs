use std::sync::{Arc, Mutex, MutexGuard};

use pktpipe_frame::ByteBuffer;
use pktpipe_transport::{SharedSink, Transport};

use crate::endpoint::Endpoint;
use crate::error::Result;

/// An [`Endpoint`] shared between threads.
///
/// Every operation runs under one mutex, so concurrent senders never
/// interleave bytes on the wire and a packet is handed to exactly one
/// receiver. A blocked receive holds the lock and stalls senders on the
/// same handle; use one endpoint per direction when that matters.
///
/// A poisoned lock is reported to the sink and recovered. The operation
/// then proceeds on the endpoint state left behind by the panicking thread.
pub struct SyncEndpoint<T: Transport> {
    inner: Arc<Mutex<Endpoint<T>>>,
    sink: SharedSink,
}

impl<T: Transport> Clone for SyncEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sink: self.sink.clone(),
        }
    }
}

impl<T: Transport> SyncEndpoint<T> {
    pub fn new(endpoint: Endpoint<T>) -> Self {
        let sink = endpoint.sink().clone();
        Self {
            inner: Arc::new(Mutex::new(endpoint)),
            sink,
        }
    }

    fn lock(&self, op: &str) -> MutexGuard<'_, Endpoint<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            self.sink.error(&format!("{op}: failed to acquire lock"));
            poisoned.into_inner()
        })
    }

    pub fn connect(&self, name: &str, id: Option<u32>) -> Result<()> {
        self.lock("Connect").connect(name, id)
    }

    pub fn accept(&self, name: &str, id: Option<u32>) -> Result<()> {
        self.lock("Accept").accept(name, id)
    }

    /// See [`Endpoint::send_packet`].
    pub fn send_packet(&self, packet: &mut ByteBuffer) -> Result<()> {
        self.lock("SendPacket").send_packet(packet)
    }

    pub fn send_payload(&self, payload: &[u8]) -> Result<()> {
        self.lock("SendPacket").send_payload(payload)
    }

    /// See [`Endpoint::recv_packet`].
    pub fn recv_packet(&self) -> ByteBuffer {
        self.lock("RecvPacket").recv_packet()
    }

    pub fn read_packet(&self) -> Result<ByteBuffer> {
        self.lock("RecvPacket").read_packet()
    }

    pub fn is_connected(&self) -> bool {
        self.lock("IsConnected").is_connected()
    }

    pub fn is_eof(&self) -> bool {
        self.lock("IsEof").is_eof()
    }

    /// Run `f` with exclusive access to the endpoint.
    pub fn with_endpoint<R>(&self, f: impl FnOnce(&mut Endpoint<T>) -> R) -> R {
        f(&mut self.lock("Endpoint"))
    }
}

impl<T: Transport> From<Endpoint<T>> for SyncEndpoint<T> {
    fn from(endpoint: Endpoint<T>) -> Self {
        Self::new(endpoint)
    }
}
