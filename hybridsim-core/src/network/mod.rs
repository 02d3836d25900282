mod device;
mod segment;

use crate::{
    addressing::{AddressError, Block},
    measure::{DataRate, Delay},
    mobility::{MobilityModel, Position},
    node::{Node, NodeId, NodeRole},
    routing::Ipv4Stack,
    wifi::{MacRole, WifiConfig},
};
use std::{
    collections::HashMap,
    net::Ipv4Addr,
};
use thiserror::Error;

pub use self::{
    device::{Device, DeviceId, DeviceKind},
    segment::{Segment, SegmentId},
};

/// The arena owning every node, device and segment of one scenario.
///
/// The `Network` keeps each [`Node`] accountable for its attached devices,
/// position and routing stack, each [`Segment`] for its transfer
/// characteristics, and the address plan for the disjointness of its
/// blocks. Nodes are shared identities: a node referenced as the endpoint
/// of several segments is one arena entry, so configuration applied
/// through any segment is visible through all of them.
///
/// Construction is build-once: create nodes, connect segments, assign
/// addresses and install stacks, then hand the network to a
/// [`Simulator`](crate::sim::Simulator) which drives it read-only.
pub struct Network {
    nodes: Vec<Node>,
    devices: Vec<Device>,
    segments: Vec<Segment>,

    /// Segment connecting each adjacent (from, to) node pair.
    adjacency: HashMap<(NodeId, NodeId), SegmentId>,

    /// The address plan registry: which block belongs to which segment.
    blocks: HashMap<Block, SegmentId>,
    segment_blocks: HashMap<SegmentId, Block>,
    addresses: HashMap<Ipv4Addr, DeviceId>,

    /// Converged next-hop tables: `(from, destination node) -> next hop`.
    /// Populated by [`Network::converge_link_state`].
    link_state: HashMap<(NodeId, NodeId), NodeId>,
    converged: bool,
}

/// Error returned when topology construction violates a structural
/// invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The node ID was not found in the arena.
    #[error("Node {node} not found")]
    NodeNotFound { node: NodeId },
    /// The segment ID was not found in the arena.
    #[error("Segment {segment} not found")]
    SegmentNotFound { segment: SegmentId },
    /// A point-to-point segment needs two distinct endpoints.
    #[error("Cannot connect {node} to itself")]
    SelfLink { node: NodeId },
    /// The same station was listed twice for one cell.
    #[error("Station {node} listed more than once in the cell")]
    DuplicateStation { node: NodeId },
    /// The access point cannot also be one of its own stations.
    #[error("Access point {node} cannot be a station of its own cell")]
    ApIsStation { node: NodeId },
    /// Mobility is configured only after devices are attached; position
    /// queries are meaningless on a node with no network presence.
    #[error("Node {node} has no devices yet; attach devices before mobility")]
    MobilityBeforeDevices { node: NodeId },
    /// The node already carries an IPv4 stack.
    #[error("Node {node} already has an IPv4 stack installed")]
    StackAlreadyInstalled { node: NodeId },
    /// The operation only applies to point-to-point segments.
    #[error("Segment {segment} is not a point-to-point segment")]
    NotPointToPoint { segment: SegmentId },
    /// The operation only applies to wireless cells.
    #[error("Segment {segment} is not a wireless cell")]
    NotWirelessCell { segment: SegmentId },
    /// The device ID was not found in the arena.
    #[error("Device {device} not found")]
    DeviceNotFound { device: DeviceId },
}

/// Builder for configuring the transfer characteristics of a
/// point-to-point segment.
///
/// Obtained via [`Network::configure_link`]. Call
/// [`apply`](LinkBuilder::apply) to commit the configuration.
pub struct LinkBuilder<'a> {
    segment: SegmentId,
    data_rate: DataRate,
    delay: Delay,
    network: &'a mut Network,
}

impl LinkBuilder<'_> {
    /// Set the transmission rate of both endpoint devices.
    pub fn set_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    /// Set the one-way propagation delay of this segment.
    pub fn set_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    /// Commit the configuration to the segment.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotPointToPoint`] if the segment is a wireless
    /// cell.
    pub fn apply(self) -> Result<(), TopologyError> {
        let Self {
            segment,
            data_rate,
            delay,
            network,
        } = self;
        match network.segment_mut(segment)? {
            Segment::PointToPoint {
                data_rate: rate_slot,
                delay: delay_slot,
                ..
            } => {
                *rate_slot = data_rate;
                *delay_slot = delay;
                Ok(())
            }
            Segment::WirelessCell { .. } => Err(TopologyError::NotPointToPoint { segment }),
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create a new, empty network.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            devices: Vec::new(),
            segments: Vec::new(),
            adjacency: HashMap::new(),
            blocks: HashMap::new(),
            segment_blocks: HashMap::new(),
            addresses: HashMap::new(),
            link_state: HashMap::new(),
            converged: false,
        }
    }

    /// Register a new node and return its [`NodeId`].
    ///
    /// Identifiers are assigned sequentially in creation order, so a
    /// rebuild with the same inputs reproduces the same handles.
    pub fn add_node(&mut self, role: NodeRole) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, role));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TopologyError> {
        self.nodes
            .get(id.index())
            .ok_or(TopologyError::NodeNotFound { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TopologyError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(TopologyError::NodeNotFound { node: id })
    }

    pub fn segment(&self, id: SegmentId) -> Result<&Segment, TopologyError> {
        self.segments
            .get(id.index())
            .ok_or(TopologyError::SegmentNotFound { segment: id })
    }

    fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Segment, TopologyError> {
        self.segments
            .get_mut(id.index())
            .ok_or(TopologyError::SegmentNotFound { segment: id })
    }

    pub fn device(&self, id: DeviceId) -> Result<&Device, TopologyError> {
        self.devices
            .get(id.index())
            .ok_or(TopologyError::DeviceNotFound { device: id })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &Segment)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (SegmentId::new(index as u32), segment))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn attach_device(&mut self, node: NodeId, segment: SegmentId, kind: DeviceKind) -> DeviceId {
        let id = DeviceId::new(self.devices.len() as u32);
        let ifindex = self.nodes[node.index()].devices().len() as u32;
        self.devices
            .push(Device::new(id, node, segment, kind, ifindex));
        self.nodes[node.index()].attach_device(id);
        id
    }

    /// Connect two nodes with a point-to-point segment.
    ///
    /// One device is created on each endpoint, in `(a, b)` order. The
    /// segment starts with the default transfer characteristics; use
    /// [`Network::configure_link`] to provision it.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::NodeNotFound`] if either endpoint is unknown.
    /// - [`TopologyError::SelfLink`] if `a == b`.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<SegmentId, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLink { node: a });
        }
        self.node(a)?;
        self.node(b)?;

        let segment = SegmentId::new(self.segments.len() as u32);
        let dev_a = self.attach_device(a, segment, DeviceKind::PointToPoint);
        let dev_b = self.attach_device(b, segment, DeviceKind::PointToPoint);
        self.segments.push(Segment::PointToPoint {
            devices: [dev_a, dev_b],
            data_rate: crate::defaults::DEFAULT_DATA_RATE,
            delay: crate::defaults::DEFAULT_DELAY,
        });
        self.adjacency.insert((a, b), segment);
        self.adjacency.insert((b, a), segment);
        self.converged = false;
        Ok(segment)
    }

    /// Configure the transfer characteristics of a point-to-point segment.
    ///
    /// Returns a [`LinkBuilder`]; call [`apply`](LinkBuilder::apply) to
    /// commit.
    pub fn configure_link(&mut self, segment: SegmentId) -> LinkBuilder<'_> {
        // builder starts from the segment's current characteristics so
        // that setting only one of them leaves the other untouched
        let (data_rate, delay) = self
            .segment(segment)
            .map(Segment::transfer_characteristics)
            .unwrap_or((
                crate::defaults::DEFAULT_DATA_RATE,
                crate::defaults::DEFAULT_DELAY,
            ));
        LinkBuilder {
            segment,
            data_rate,
            delay,
            network: self,
        }
    }

    /// Create a wireless cell with `ap` as its coordinator and one device
    /// per station, all tagged with the configuration's SSID.
    ///
    /// The access point's device is installed first, then the stations in
    /// the given order; addresses are later bound in the same order.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::NodeNotFound`] if any node is unknown.
    /// - [`TopologyError::ApIsStation`] if `ap` appears among `stations`.
    /// - [`TopologyError::DuplicateStation`] if a station appears twice.
    pub fn create_wireless_cell(
        &mut self,
        ap: NodeId,
        stations: &[NodeId],
        config: WifiConfig,
    ) -> Result<SegmentId, TopologyError> {
        self.node(ap)?;
        for (index, &station) in stations.iter().enumerate() {
            self.node(station)?;
            if station == ap {
                return Err(TopologyError::ApIsStation { node: station });
            }
            if stations[..index].contains(&station) {
                return Err(TopologyError::DuplicateStation { node: station });
            }
        }

        let segment = SegmentId::new(self.segments.len() as u32);
        let ap_device = self.attach_device(ap, segment, DeviceKind::Wireless(MacRole::AccessPoint));
        let station_role = MacRole::Station {
            active_probing: config.active_probing,
        };
        let station_devices: Vec<DeviceId> = stations
            .iter()
            .map(|&station| self.attach_device(station, segment, DeviceKind::Wireless(station_role)))
            .collect();

        // stations exchange traffic through the access point only
        for &station in stations {
            self.adjacency.insert((station, ap), segment);
            self.adjacency.insert((ap, station), segment);
        }

        self.segments.push(Segment::WirelessCell {
            ap: ap_device,
            stations: station_devices,
            config,
        });
        self.converged = false;
        Ok(segment)
    }

    /// Replace the configuration of a wireless cell.
    pub fn configure_cell(
        &mut self,
        segment: SegmentId,
        config: WifiConfig,
    ) -> Result<(), TopologyError> {
        match self.segment_mut(segment)? {
            Segment::WirelessCell {
                config: config_slot,
                ..
            } => {
                *config_slot = config;
                Ok(())
            }
            Segment::PointToPoint { .. } => Err(TopologyError::NotWirelessCell { segment }),
        }
    }

    /// Attach a mobility behaviour to a node.
    ///
    /// # Errors
    ///
    /// [`TopologyError::MobilityBeforeDevices`] if the node has no devices
    /// yet — mobility configuration is only valid after device attachment.
    pub fn set_mobility(
        &mut self,
        node: NodeId,
        mobility: MobilityModel,
    ) -> Result<(), TopologyError> {
        if self.node(node)?.devices().is_empty() {
            return Err(TopologyError::MobilityBeforeDevices { node });
        }
        self.node_mut(node)?.set_mobility(mobility);
        Ok(())
    }

    /// Place a node at an initial position.
    ///
    /// Subject to the same ordering invariant as [`Network::set_mobility`].
    pub fn set_position(&mut self, node: NodeId, position: Position) -> Result<(), TopologyError> {
        if self.node(node)?.devices().is_empty() {
            return Err(TopologyError::MobilityBeforeDevices { node });
        }
        self.node_mut(node)?.set_position(position);
        Ok(())
    }

    pub(crate) fn update_position(&mut self, node: NodeId, position: Position) {
        self.nodes[node.index()].set_position(position);
    }

    /// Bind one address per device of `segment`, drawn from `block` in
    /// device-installation order starting at host number 1.
    ///
    /// Assignment is idempotent per block: re-assigning the same block to
    /// the same segment returns the same addresses without side effects.
    ///
    /// # Errors
    ///
    /// - [`AddressError::BlockInUse`] if the block already belongs to a
    ///   different segment.
    /// - [`AddressError::SegmentAlreadyAddressed`] if the segment already
    ///   drew its addresses from a different block.
    /// - [`AddressError::BlockExhausted`] if the segment has more devices
    ///   than a /24 has host numbers.
    pub fn assign_block(
        &mut self,
        segment: SegmentId,
        block: Block,
    ) -> Result<Vec<Ipv4Addr>, AddressError> {
        let devices = self.segment(segment)?.devices();

        if let Some(&owner) = self.blocks.get(&block) {
            if owner == segment {
                // idempotent re-assignment
                return Ok(devices
                    .iter()
                    .filter_map(|&device| self.devices[device.index()].address())
                    .collect());
            }
            return Err(AddressError::BlockInUse {
                block,
                assigned_to: owner,
            });
        }
        if let Some(&assigned) = self.segment_blocks.get(&segment) {
            return Err(AddressError::SegmentAlreadyAddressed { segment, assigned });
        }

        let mut assigned = Vec::with_capacity(devices.len());
        for (index, &device) in devices.iter().enumerate() {
            let address = block.addr(index as u32 + 1)?;
            self.devices[device.index()].set_address(address, Block::PREFIX_LEN);
            self.addresses.insert(address, device);
            assigned.push(address);
        }

        self.blocks.insert(block, segment);
        self.segment_blocks.insert(segment, block);
        Ok(assigned)
    }

    /// The block assigned to a segment, if any.
    pub fn block_of(&self, segment: SegmentId) -> Option<Block> {
        self.segment_blocks.get(&segment).copied()
    }

    /// Install an IPv4 stack (its routing layers) on a node.
    ///
    /// # Errors
    ///
    /// [`TopologyError::StackAlreadyInstalled`] if the node already has
    /// one — stacks are installed exactly once per scenario.
    pub fn install_stack(&mut self, node: NodeId, stack: Ipv4Stack) -> Result<(), TopologyError> {
        if self.node(node)?.has_stack() {
            return Err(TopologyError::StackAlreadyInstalled { node });
        }
        self.node_mut(node)?.install_stack(stack);
        Ok(())
    }

    /// The node owning `address`, if it has been bound.
    pub fn node_for_address(&self, address: Ipv4Addr) -> Option<NodeId> {
        self.addresses
            .get(&address)
            .map(|&device| self.devices[device.index()].node())
    }

    /// The first bound address of a node, in device-installation order.
    pub fn primary_address(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.node(node)
            .ok()?
            .devices()
            .iter()
            .find_map(|&device| self.devices[device.index()].address())
    }

    /// The segment connecting two adjacent nodes, if any.
    ///
    /// For a wireless cell only station↔access-point pairs are adjacent;
    /// stations reach each other through the access point.
    pub fn segment_between(&self, a: NodeId, b: NodeId) -> Option<SegmentId> {
        self.adjacency.get(&(a, b)).copied()
    }

    /// The device of `node` that faces `segment`.
    pub fn device_on_segment(&self, node: NodeId, segment: SegmentId) -> Option<DeviceId> {
        self.node(node)
            .ok()?
            .devices()
            .iter()
            .copied()
            .find(|&device| self.devices[device.index()].segment() == segment)
    }

    /// Compute the converged link-state tables over the segment graph.
    ///
    /// This stands in for the proactive protocol's periodic topology
    /// exchange: a breadth-first shortest-path (hop count) computation per
    /// node, with deterministic tie-breaking by node identifier. The
    /// scenario never mutates the topology mid-run, so converging once
    /// before the run is equivalent to periodic recomputation.
    pub fn converge_link_state(&mut self) {
        self.link_state.clear();

        // deterministic neighbor ordering
        let mut neighbors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for &(from, to) in self.adjacency.keys() {
            neighbors.entry(from).or_default().push(to);
        }
        for list in neighbors.values_mut() {
            list.sort();
        }

        for source in self.nodes.iter().map(Node::id) {
            let mut first_hop: HashMap<NodeId, NodeId> = HashMap::new();
            let mut frontier = std::collections::VecDeque::new();
            frontier.push_back(source);
            let mut visited: Vec<bool> = vec![false; self.nodes.len()];
            visited[source.index()] = true;

            while let Some(current) = frontier.pop_front() {
                let Some(adjacent) = neighbors.get(&current) else {
                    continue;
                };
                for &next in adjacent {
                    if visited[next.index()] {
                        continue;
                    }
                    visited[next.index()] = true;
                    let hop = if current == source {
                        next
                    } else {
                        first_hop[&current]
                    };
                    first_hop.insert(next, hop);
                    self.link_state.insert((source, next), hop);
                    frontier.push_back(next);
                }
            }
        }
        self.converged = true;
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// The converged next hop from `from` towards `to`, if a path exists.
    pub fn link_state_next_hop(&self, from: NodeId, to: NodeId) -> Option<NodeId> {
        self.link_state.get(&(from, to)).copied()
    }

    /// Resolve the next hop for a destination address through the node's
    /// layered routing policy. `None` if the node has no stack or no layer
    /// offers a route.
    pub fn resolve_next_hop(&self, from: NodeId, destination: Ipv4Addr) -> Option<NodeId> {
        self.node(from)
            .ok()?
            .stack()?
            .resolve(from, destination, self)
    }
}
