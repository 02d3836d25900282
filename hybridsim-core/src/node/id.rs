use std::fmt;

/// The identifier of a node in the simulated network.
///
/// Node identifiers are indices into the [`Network`]'s node arena. A node is
/// the same identity everywhere its `NodeId` appears: attaching a device, an
/// address or a routing stack through one handle is visible through every
/// segment that references it.
///
/// [`Network`]: crate::network::Network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
