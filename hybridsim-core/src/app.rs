use crate::node::NodeId;
use std::{fmt, net::Ipv4Addr, time::Duration};

/// The identifier of an application installed on the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(u32);

impl AppId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app{}", self.0)
    }
}

/// A UDP echo responder.
///
/// While running it answers every datagram received on its port with a
/// reply of the same length, source and destination swapped.
pub struct EchoServer {
    port: u16,
    received: u64,
}

impl EchoServer {
    pub fn new(port: u16) -> Self {
        Self { port, received: 0 }
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Datagrams received (and echoed) so far.
    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }

    pub(crate) fn record_received(&mut self) {
        self.received += 1;
    }
}

/// A UDP echo requester.
///
/// Sends `max_packets` datagrams of `payload_len` bytes, one every
/// `interval`, starting the moment the application starts, and counts
/// the echoes that come back.
pub struct EchoClient {
    destination: Ipv4Addr,
    destination_port: u16,
    local_port: u16,
    max_packets: u64,
    interval: Duration,
    payload_len: u64,
    sent: u64,
    replies: u64,
    last_reply_at: Option<Duration>,
}

impl EchoClient {
    pub fn new(destination: Ipv4Addr, destination_port: u16) -> Self {
        Self {
            destination,
            destination_port,
            local_port: crate::defaults::CLIENT_EPHEMERAL_PORT,
            max_packets: 1,
            interval: Duration::from_secs(1),
            payload_len: 1024,
            sent: 0,
            replies: 0,
            last_reply_at: None,
        }
    }

    pub fn set_max_packets(mut self, max_packets: u64) -> Self {
        self.max_packets = max_packets;
        self
    }

    pub fn set_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn set_payload_len(mut self, payload_len: u64) -> Self {
        self.payload_len = payload_len;
        self
    }

    #[inline]
    pub fn destination(&self) -> Ipv4Addr {
        self.destination
    }

    #[inline]
    pub fn destination_port(&self) -> u16 {
        self.destination_port
    }

    #[inline]
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    #[inline]
    pub fn max_packets(&self) -> u64 {
        self.max_packets
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn payload_len(&self) -> u64 {
        self.payload_len
    }

    #[inline]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Echo replies received so far.
    #[inline]
    pub fn replies(&self) -> u64 {
        self.replies
    }

    /// Virtual time of the last echo reply, if any came back.
    #[inline]
    pub fn last_reply_at(&self) -> Option<Duration> {
        self.last_reply_at
    }

    pub(crate) fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub(crate) fn record_reply(&mut self, at: Duration) {
        self.replies += 1;
        self.last_reply_at = Some(at);
    }
}

pub enum AppKind {
    EchoServer(EchoServer),
    EchoClient(EchoClient),
}

/// One application instance bound to a node, with its activity window.
pub struct Application {
    node: NodeId,
    kind: AppKind,
    running: bool,
    start: Duration,
    stop: Duration,
}

impl Application {
    pub(crate) fn new(node: NodeId, kind: AppKind, start: Duration, stop: Duration) -> Self {
        Self {
            node,
            kind,
            running: false,
            start,
            stop,
        }
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn kind(&self) -> &AppKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut AppKind {
        &mut self.kind
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    #[inline]
    pub fn start(&self) -> Duration {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> Duration {
        self.stop
    }

    pub fn as_server(&self) -> Option<&EchoServer> {
        match &self.kind {
            AppKind::EchoServer(server) => Some(server),
            AppKind::EchoClient(_) => None,
        }
    }

    pub fn as_client(&self) -> Option<&EchoClient> {
        match &self.kind {
            AppKind::EchoClient(client) => Some(client),
            AppKind::EchoServer(_) => None,
        }
    }
}
