mod id;

pub use self::id::NodeId;
use crate::{
    mobility::{MobilityModel, Position},
    network::DeviceId,
    routing::Ipv4Stack,
};

/// The role a node plays in the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// A wired router, endpoint of one or more point-to-point segments.
    WiredRouter,
    /// The coordinator of a wireless cell. May also be the endpoint of
    /// point-to-point segments (it bridges the cell into the wired tree).
    AccessPoint,
    /// A mobile client served by an access point.
    Station,
}

/// A simulated host, managed by the [`Network`] arena.
///
/// `Node` records the devices attached to it, its optional mobility
/// behaviour and position, and its optional IPv4 stack. You never construct
/// a `Node` directly — use [`Network::add_node`] to register one and obtain
/// its [`NodeId`].
///
/// [`Network`]: crate::network::Network
/// [`Network::add_node`]: crate::network::Network::add_node
pub struct Node {
    id: NodeId,
    role: NodeRole,
    devices: Vec<DeviceId>,
    mobility: Option<MobilityModel>,
    position: Option<Position>,
    stack: Option<Ipv4Stack>,
}

impl Node {
    pub(crate) fn new(id: NodeId, role: NodeRole) -> Self {
        Self {
            id,
            role,
            devices: Vec::new(),
            mobility: None,
            position: None,
            stack: None,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// The devices attached to this node, in installation order.
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    pub fn mobility(&self) -> Option<&MobilityModel> {
        self.mobility.as_ref()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns the node's IPv4 stack, if one has been installed.
    pub fn stack(&self) -> Option<&Ipv4Stack> {
        self.stack.as_ref()
    }

    pub fn has_stack(&self) -> bool {
        self.stack.is_some()
    }

    pub(crate) fn attach_device(&mut self, device: DeviceId) {
        self.devices.push(device);
    }

    pub(crate) fn set_mobility(&mut self, mobility: MobilityModel) {
        self.mobility = Some(mobility);
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub(crate) fn install_stack(&mut self, stack: Ipv4Stack) {
        self.stack = Some(stack);
    }
}
