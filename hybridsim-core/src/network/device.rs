use crate::{network::SegmentId, node::NodeId, wifi::MacRole};
use std::{fmt, net::Ipv4Addr};

/// The identifier of a device in the [`Network`] arena.
///
/// [`Network`]: crate::network::Network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// What kind of link layer a device speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    PointToPoint,
    Wireless(MacRole),
}

/// A network interface: belongs to exactly one node and one segment, and
/// carries at most one IPv4 address.
pub struct Device {
    id: DeviceId,
    node: NodeId,
    segment: SegmentId,
    kind: DeviceKind,
    /// Index of this device among its node's devices, used to name
    /// capture files.
    ifindex: u32,
    address: Option<Ipv4Addr>,
    prefix_len: Option<u8>,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        node: NodeId,
        segment: SegmentId,
        kind: DeviceKind,
        ifindex: u32,
    ) -> Self {
        Self {
            id,
            node,
            segment,
            kind,
            ifindex,
            address: None,
            prefix_len: None,
        }
    }

    #[inline]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    #[inline]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    #[inline]
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    pub fn prefix_len(&self) -> Option<u8> {
        self.prefix_len
    }

    pub(crate) fn set_address(&mut self, address: Ipv4Addr, prefix_len: u8) {
        self.address = Some(address);
        self.prefix_len = Some(prefix_len);
    }
}
