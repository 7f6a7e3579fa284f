use pktpipe_frame::{encode_packet, ByteBuffer, FrameError, Receiver, Sender, MAX_PACKET_LEN};
use pktpipe_transport::{default_sink, ChannelAddress, SharedSink, Transport};
use tracing::{debug, trace};

use crate::config::{EndpointConfig, Establish};
use crate::error::{EndpointError, Result};
use crate::synchronized::SyncEndpoint;

/// Where an endpoint is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// No successful connect or accept yet.
    Unconnected,
    /// Stream established and still readable.
    Connected,
    /// The receive side hit end of stream or a fault. Terminal.
    Closed,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Client,
    Server,
}

impl Role {
    fn op(self) -> &'static str {
        match self {
            Role::Client => "Connect",
            Role::Server => "Accept",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Role::Client => "connect to",
            Role::Server => "accept on",
        }
    }
}

/// One side of a point-to-point packet channel.
///
/// An endpoint owns at most one stream, established either by
/// [`connect`](Self::connect) (client role) or [`accept`](Self::accept)
/// (server role), and released when the endpoint is dropped. Failures are
/// reported to the endpoint's error sink and returned as values; nothing
/// here panics on a transport error.
pub struct Endpoint<T: Transport> {
    transport: T,
    stream: Option<T::Stream>,
    connected: bool,
    eof: bool,
    config: EndpointConfig,
    sink: SharedSink,
}

impl<T: Transport> Endpoint<T> {
    /// Create an unconnected endpoint with default configuration.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stream: None,
            connected: false,
            eof: false,
            config: EndpointConfig::default(),
            sink: default_sink(),
        }
    }

    /// Override establishment strategies.
    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    /// Report failures to `sink` instead of the default tracing sink.
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Wrap this endpoint for shared use across threads.
    pub fn into_sync(self) -> SyncEndpoint<T> {
        SyncEndpoint::new(self)
    }

    /// Connect to the channel `name` (suffixed with `_<id>` when given).
    ///
    /// No-op when already connected. With the default strategy this blocks
    /// until the peer is listening or a non-transient error occurs.
    pub fn connect(&mut self, name: &str, id: Option<u32>) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        self.establish(ChannelAddress::resolve(name, id), Role::Client)
    }

    /// Listen on the channel `name` and accept a single peer.
    ///
    /// No-op when already connected. With the default strategy exactly one
    /// blocking accept is performed.
    pub fn accept(&mut self, name: &str, id: Option<u32>) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        self.establish(ChannelAddress::resolve(name, id), Role::Server)
    }

    fn establish(&mut self, address: ChannelAddress, role: Role) -> Result<()> {
        let strategy: Establish = match role {
            Role::Client => self.config.connect,
            Role::Server => self.config.accept,
        };

        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            let attempt = match role {
                Role::Client => self.transport.connect(&address),
                Role::Server => self.transport.accept(&address),
            };

            let err = match attempt {
                Ok(stream) => {
                    self.stream = Some(stream);
                    self.connected = true;
                    debug!(
                        %address,
                        attempts,
                        role = role.op(),
                        transport = self.transport.name(),
                        "endpoint established"
                    );
                    return Ok(());
                }
                Err(err) => err,
            };

            match strategy.policy() {
                Some(policy) if err.is_transient() => {
                    if !policy.allows(attempts) {
                        self.sink.error(&format!(
                            "{}: giving up on stream {address} after {attempts} attempts, last error {}",
                            role.op(),
                            err.code()
                        ));
                        return Err(EndpointError::RetriesExhausted { address, attempts });
                    }
                    trace!(%address, attempts, "peer not ready, retrying");
                    policy.wait(attempts);
                }
                _ => {
                    self.sink.error(&format!(
                        "{}: failed to {} stream {address} because of error {}",
                        role.op(),
                        role.action(),
                        err.code()
                    ));
                    return Err(err.into());
                }
            }
        }
    }

    /// Send one fully formed packet (length byte already written).
    ///
    /// The buffer's read cursor is 0 afterwards.
    pub fn send_packet(&mut self, packet: &mut ByteBuffer) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            packet.set_rpos(0);
            self.sink.error("SendPacket: endpoint not connected");
            return Err(EndpointError::NotConnected);
        };
        Sender::with_sink(stream, self.sink.clone()).send_packet(packet)?;
        Ok(())
    }

    /// Frame `payload` and send it.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        let mut packet = ByteBuffer::with_capacity(MAX_PACKET_LEN);
        encode_packet(payload, &mut packet)?;
        self.send_packet(&mut packet)
    }

    /// Receive one packet, length byte included.
    ///
    /// Returns an empty or partial buffer when the stream ends or faults;
    /// check [`is_eof`](Self::is_eof) and the buffer size after every call.
    pub fn recv_packet(&mut self) -> ByteBuffer {
        if self.eof {
            return ByteBuffer::new();
        }
        let Some(stream) = self.stream.as_mut() else {
            self.sink.error("RecvPacket: endpoint not connected");
            return ByteBuffer::new();
        };
        let mut receiver = Receiver::with_sink(stream, self.sink.clone());
        let packet = receiver.recv_packet();
        self.eof |= receiver.is_eof();
        packet
    }

    /// Receive one packet, returning why the stream stopped on failure.
    ///
    /// `FrameError::ConnectionClosed` means the peer closed cleanly;
    /// `FrameError::Io` is a transport fault.
    pub fn read_packet(&mut self) -> Result<ByteBuffer> {
        if self.eof {
            return Err(FrameError::ConnectionClosed.into());
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(EndpointError::NotConnected);
        };
        let mut receiver = Receiver::with_sink(stream, self.sink.clone());
        let result = receiver.read_packet();
        self.eof |= receiver.is_eof();
        Ok(result?)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once the receive side can no longer produce data.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// True while the endpoint holds a stream.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn state(&self) -> EndpointState {
        match (self.connected, self.eof) {
            (false, _) => EndpointState::Unconnected,
            (true, false) => EndpointState::Connected,
            (true, true) => EndpointState::Closed,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }
}

impl<T: Transport + Default> Default for Endpoint<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
