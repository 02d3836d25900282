use crate::topology::Topology;
use hybridsim_core::addressing::{AddressError, Block};
use std::net::Ipv4Addr;

/// The addresses bound by [`assign`], in block-assignment order.
pub struct AddressPlan {
    /// Cell addresses: access point first, then stations in creation
    /// order.
    pub wireless: Vec<Ipv4Addr>,
    /// Per point-to-point segment, the two endpoint addresses in
    /// device-installation order.
    pub point_to_point: Vec<Vec<Ipv4Addr>>,
}

/// Base of the wireless cell's block.
fn wireless_block() -> Result<Block, AddressError> {
    Block::new(Ipv4Addr::new(192, 2, 1, 0))
}

/// Base of the `k`th (1-based) point-to-point segment's block.
fn point_to_point_block(k: u8) -> Result<Block, AddressError> {
    Block::new(Ipv4Addr::new(192, 1, k, 0))
}

/// Assign one disjoint /24 per segment: the wireless cell first, then
/// the seven point-to-point segments in creation order. Within each
/// block, hosts are numbered from 1 in device-installation order.
pub fn assign(topology: &mut Topology) -> Result<AddressPlan, AddressError> {
    let network = &mut topology.network;

    let wireless = network.assign_block(topology.cell, wireless_block()?)?;

    let mut point_to_point = Vec::with_capacity(topology.point_to_point.len());
    for (index, &segment) in topology.point_to_point.iter().enumerate() {
        let block = point_to_point_block(index as u8 + 1)?;
        point_to_point.push(network.assign_block(segment, block)?);
    }

    Ok(AddressPlan {
        wireless,
        point_to_point,
    })
}
