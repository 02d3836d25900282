use crate::network::SegmentId;
use std::{fmt, net::Ipv4Addr, str::FromStr};
use thiserror::Error;

/// A /24 IPv4 address block, assigned to exactly one segment.
///
/// The prefix length is fixed for the whole scenario: each segment gets one
/// /24 and interface addresses are handed out from host number 1 upward in
/// device-installation order.
///
/// # Example
///
/// ```
/// # use hybridsim_core::addressing::Block;
/// # use std::net::Ipv4Addr;
/// let block: Block = "192.1.1.0".parse().unwrap();
/// assert_eq!(block.addr(1).unwrap(), Ipv4Addr::new(192, 1, 1, 1));
/// assert!(block.contains(Ipv4Addr::new(192, 1, 1, 254)));
/// assert!(!block.contains(Ipv4Addr::new(192, 1, 2, 1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block(Ipv4Addr);

impl Block {
    /// Prefix length of every block in the scenario.
    pub const PREFIX_LEN: u8 = 24;

    /// Create a block from its network base address.
    ///
    /// # Errors
    ///
    /// [`AddressError::MisalignedBase`] if the host octet of `base` is not
    /// zero.
    pub fn new(base: Ipv4Addr) -> Result<Self, AddressError> {
        if base.octets()[3] != 0 {
            return Err(AddressError::MisalignedBase { base });
        }
        Ok(Self(base))
    }

    #[inline]
    pub fn base(self) -> Ipv4Addr {
        self.0
    }

    /// The address of host number `host` inside this block.
    ///
    /// # Errors
    ///
    /// [`AddressError::BlockExhausted`] unless `1 <= host <= 254` (0 is the
    /// network address, 255 the broadcast address).
    pub fn addr(self, host: u32) -> Result<Ipv4Addr, AddressError> {
        if host == 0 || host > 254 {
            return Err(AddressError::BlockExhausted { block: self });
        }
        let [a, b, c, _] = self.0.octets();
        Ok(Ipv4Addr::new(a, b, c, host as u8))
    }

    pub fn contains(self, addr: Ipv4Addr) -> bool {
        let base = u32::from(self.0);
        let addr = u32::from(addr);
        addr >> 8 == base >> 8
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::PREFIX_LEN)
    }
}

impl FromStr for Block {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = s
            .parse::<Ipv4Addr>()
            .map_err(|_| AddressError::InvalidBase {
                base: s.to_string(),
            })?;
        Self::new(base)
    }
}

/// Errors produced by the address plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The block base is not aligned on a /24 boundary.
    #[error("Block base {base} is not aligned on a /24 boundary")]
    MisalignedBase { base: Ipv4Addr },
    /// The block base string is not a valid IPv4 address.
    #[error("`{base}' is not a valid IPv4 network base")]
    InvalidBase { base: String },
    /// The block is already assigned to a different segment.
    ///
    /// Blocks are never reused: every segment of the scenario must draw
    /// its addresses from its own /24.
    #[error("Block {block} is already assigned to segment {assigned_to}")]
    BlockInUse {
        block: Block,
        assigned_to: SegmentId,
    },
    /// The segment already drew its addresses from a different block.
    #[error("Segment {segment} already has addresses from block {assigned}")]
    SegmentAlreadyAddressed { segment: SegmentId, assigned: Block },
    /// More interfaces on the segment than host numbers in a /24.
    #[error("Block {block} has no host numbers left")]
    BlockExhausted { block: Block },
    /// The segment handle itself was invalid.
    #[error(transparent)]
    Topology(#[from] crate::network::TopologyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_base_only() {
        assert!(Block::new(Ipv4Addr::new(192, 1, 1, 0)).is_ok());
        assert_eq!(
            Block::new(Ipv4Addr::new(192, 1, 1, 5)),
            Err(AddressError::MisalignedBase {
                base: Ipv4Addr::new(192, 1, 1, 5)
            })
        );
    }

    #[test]
    fn host_numbering() {
        let block = Block::new(Ipv4Addr::new(192, 2, 1, 0)).unwrap();
        assert_eq!(block.addr(1).unwrap(), Ipv4Addr::new(192, 2, 1, 1));
        assert_eq!(block.addr(254).unwrap(), Ipv4Addr::new(192, 2, 1, 254));
        assert!(block.addr(0).is_err());
        assert!(block.addr(255).is_err());
    }

    #[test]
    fn containment() {
        let block = Block::new(Ipv4Addr::new(192, 1, 3, 0)).unwrap();
        assert!(block.contains(Ipv4Addr::new(192, 1, 3, 1)));
        assert!(block.contains(Ipv4Addr::new(192, 1, 3, 254)));
        assert!(!block.contains(Ipv4Addr::new(192, 1, 4, 1)));
    }

    #[test]
    fn parse_and_display() {
        let block: Block = "192.1.7.0".parse().unwrap();
        assert_eq!(block.to_string(), "192.1.7.0/24");
        assert!("not-an-address".parse::<Block>().is_err());
        assert!("192.1.7.9".parse::<Block>().is_err());
    }
}
