use crate::{network::Network, node::NodeId};
use std::net::Ipv4Addr;
use thiserror::Error;

/// One routing-resolution strategy, consulted per packet hop.
///
/// Strategies are composed into an [`Ipv4Stack`] as an ordered list of
/// priority layers; a lookup tries each layer in ascending priority order
/// and takes the first next hop offered.
pub trait RoutingStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The node to forward a packet for `destination` to, from the point
    /// of view of `from`. `None` means this layer has no opinion and the
    /// lookup falls through to the next layer.
    fn next_hop(&self, from: NodeId, destination: Ipv4Addr, network: &Network) -> Option<NodeId>;
}

/// A manually populated routing table.
///
/// Entries match destinations by prefix; the first matching entry wins.
/// In the fixed scenario this layer is installed empty — it exists so that
/// operator-pinned routes always take precedence over computed ones.
#[derive(Default)]
pub struct StaticRouting {
    routes: Vec<StaticRoute>,
}

struct StaticRoute {
    network: Ipv4Addr,
    prefix_len: u8,
    next_hop: NodeId,
}

impl StaticRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the next hop for every destination inside `network`/`prefix_len`.
    pub fn add_route(&mut self, network: Ipv4Addr, prefix_len: u8, next_hop: NodeId) {
        self.routes.push(StaticRoute {
            network,
            prefix_len,
            next_hop,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn prefix_matches(addr: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let shift = 32 - u32::from(prefix_len.min(32));
    (u32::from(addr) >> shift) == (u32::from(network) >> shift)
}

impl RoutingStrategy for StaticRouting {
    fn name(&self) -> &'static str {
        "static"
    }

    fn next_hop(&self, _from: NodeId, destination: Ipv4Addr, _network: &Network) -> Option<NodeId> {
        self.routes
            .iter()
            .find(|route| prefix_matches(destination, route.network, route.prefix_len))
            .map(|route| route.next_hop)
    }
}

/// The proactive link-state layer.
///
/// The protocol's periodic topology exchange and shortest-path computation
/// are owned by the engine: [`Network::converge_link_state`] computes the
/// converged next-hop tables over the segment graph before the run starts.
/// This strategy only consults them.
///
/// [`Network::converge_link_state`]: crate::network::Network::converge_link_state
#[derive(Default)]
pub struct LinkStateRouting;

impl LinkStateRouting {
    pub fn new() -> Self {
        Self
    }
}

impl RoutingStrategy for LinkStateRouting {
    fn name(&self) -> &'static str {
        "link-state"
    }

    fn next_hop(&self, from: NodeId, destination: Ipv4Addr, network: &Network) -> Option<NodeId> {
        let target = network.node_for_address(destination)?;
        if target == from {
            return Some(from);
        }
        network.link_state_next_hop(from, target)
    }
}

/// A node's IPv4 stack: its ordered list of routing layers.
///
/// Layers are kept sorted by ascending priority; lower numbers are
/// consulted first. Every priority must be distinct.
#[derive(Default)]
pub struct Ipv4Stack {
    layers: Vec<RoutingLayer>,
}

pub struct RoutingLayer {
    priority: u8,
    strategy: Box<dyn RoutingStrategy>,
}

impl RoutingLayer {
    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn strategy(&self) -> &dyn RoutingStrategy {
        self.strategy.as_ref()
    }
}

/// Error installing a routing layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// Two layers on the same stack share a priority number.
    #[error("A routing layer with priority {priority} is already installed")]
    DuplicatePriority { priority: u8 },
}

impl Ipv4Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a routing layer at the given priority.
    ///
    /// # Errors
    ///
    /// [`RoutingError::DuplicatePriority`] if a layer with the same
    /// priority is already installed.
    pub fn add_layer(
        &mut self,
        priority: u8,
        strategy: Box<dyn RoutingStrategy>,
    ) -> Result<(), RoutingError> {
        if self.layers.iter().any(|layer| layer.priority == priority) {
            return Err(RoutingError::DuplicatePriority { priority });
        }
        let at = self
            .layers
            .iter()
            .position(|layer| layer.priority > priority)
            .unwrap_or(self.layers.len());
        self.layers.insert(at, RoutingLayer { priority, strategy });
        Ok(())
    }

    /// The installed layers in ascending priority order.
    pub fn layers(&self) -> &[RoutingLayer] {
        &self.layers
    }

    /// Resolve the next hop for `destination`, trying each layer in
    /// priority order.
    pub(crate) fn resolve(
        &self,
        from: NodeId,
        destination: Ipv4Addr,
        network: &Network,
    ) -> Option<NodeId> {
        self.layers
            .iter()
            .find_map(|layer| layer.strategy.next_hop(from, destination, network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{network::Network, node::NodeRole};

    #[test]
    fn layers_sorted_by_priority() {
        let mut stack = Ipv4Stack::new();
        stack.add_layer(10, Box::new(LinkStateRouting::new())).unwrap();
        stack.add_layer(1, Box::new(StaticRouting::new())).unwrap();

        let priorities: Vec<u8> = stack.layers().iter().map(|l| l.priority()).collect();
        assert_eq!(priorities, vec![1, 10]);
        assert_eq!(stack.layers()[0].strategy().name(), "static");
        assert_eq!(stack.layers()[1].strategy().name(), "link-state");
    }

    #[test]
    fn duplicate_priority_rejected() {
        let mut stack = Ipv4Stack::new();
        stack.add_layer(1, Box::new(StaticRouting::new())).unwrap();
        let err = stack
            .add_layer(1, Box::new(LinkStateRouting::new()))
            .unwrap_err();
        assert_eq!(err, RoutingError::DuplicatePriority { priority: 1 });
    }

    #[test]
    fn static_prefix_matching() {
        let mut network = Network::new();
        let gateway = network.add_node(NodeRole::WiredRouter);

        let mut routing = StaticRouting::new();
        routing.add_route(Ipv4Addr::new(192, 1, 5, 0), 24, gateway);

        let from = gateway;
        assert_eq!(
            routing.next_hop(from, Ipv4Addr::new(192, 1, 5, 2), &network),
            Some(gateway)
        );
        assert_eq!(
            routing.next_hop(from, Ipv4Addr::new(192, 1, 6, 2), &network),
            None
        );
    }

    #[test]
    fn static_default_route() {
        let mut network = Network::new();
        let gateway = network.add_node(NodeRole::WiredRouter);

        let mut routing = StaticRouting::new();
        routing.add_route(Ipv4Addr::new(0, 0, 0, 0), 0, gateway);

        assert_eq!(
            routing.next_hop(gateway, Ipv4Addr::new(10, 0, 0, 1), &network),
            Some(gateway)
        );
    }
}
