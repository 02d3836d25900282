use crate::node::NodeId;
use std::{fmt, net::Ipv4Addr};

/// Unique identifier of a packet within one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketId(u64);

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkt{}", self.0)
    }
}

/// Hands out [`PacketId`]s in send order.
#[derive(Default)]
pub struct PacketIdGenerator(u64);

impl PacketIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self) -> PacketId {
        let id = PacketId(self.0);
        self.0 += 1;
        id
    }
}

/// One UDP datagram in flight.
///
/// Only the envelope is simulated: the payload is represented by its
/// length, which is all the transmission-time model and the capture
/// files need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    id: PacketId,
    source_node: NodeId,
    source: Ipv4Addr,
    source_port: u16,
    destination: Ipv4Addr,
    destination_port: u16,
    payload_len: u64,
}

impl Packet {
    pub fn builder() -> PacketBuilder {
        PacketBuilder::default()
    }

    #[inline]
    pub fn id(&self) -> PacketId {
        self.id
    }

    /// The node that sent this packet.
    #[inline]
    pub fn source_node(&self) -> NodeId {
        self.source_node
    }

    #[inline]
    pub fn source(&self) -> Ipv4Addr {
        self.source
    }

    #[inline]
    pub fn source_port(&self) -> u16 {
        self.source_port
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
    pub fn payload_len(&self) -> u64 {
        self.payload_len
    }

    /// Total on-wire size, headers included.
    pub fn wire_len(&self) -> u64 {
        self.payload_len + crate::defaults::IPV4_UDP_HEADER_LEN
    }
}

/// Builder for [`Packet`]. All envelope fields are mandatory.
#[derive(Default)]
pub struct PacketBuilder {
    source_node: Option<NodeId>,
    source: Option<Ipv4Addr>,
    source_port: Option<u16>,
    destination: Option<Ipv4Addr>,
    destination_port: Option<u16>,
    payload_len: Option<u64>,
}

impl PacketBuilder {
    pub fn from(mut self, node: NodeId, address: Ipv4Addr, port: u16) -> Self {
        self.source_node = Some(node);
        self.source = Some(address);
        self.source_port = Some(port);
        self
    }

    pub fn to(mut self, address: Ipv4Addr, port: u16) -> Self {
        self.destination = Some(address);
        self.destination_port = Some(port);
        self
    }

    pub fn payload_len(mut self, len: u64) -> Self {
        self.payload_len = Some(len);
        self
    }

    /// Finalize the packet, drawing its identifier from `ids`.
    ///
    /// # Errors
    ///
    /// If any envelope field was left unset.
    pub fn build(self, ids: &mut PacketIdGenerator) -> anyhow::Result<Packet> {
        let Some(source_node) = self.source_node else {
            anyhow::bail!("missing packet source node")
        };
        let Some(source) = self.source else {
            anyhow::bail!("missing packet source address")
        };
        let Some(source_port) = self.source_port else {
            anyhow::bail!("missing packet source port")
        };
        let Some(destination) = self.destination else {
            anyhow::bail!("missing packet destination address")
        };
        let Some(destination_port) = self.destination_port else {
            anyhow::bail!("missing packet destination port")
        };
        let Some(payload_len) = self.payload_len else {
            anyhow::bail!("missing packet payload length")
        };
        Ok(Packet {
            id: ids.generate(),
            source_node,
            source,
            source_port,
            destination,
            destination_port,
            payload_len,
        })
    }
}
