use hybridsim_core::{
    Network, TopologyError,
    routing::{Ipv4Stack, LinkStateRouting, RoutingError, StaticRouting},
};
use thiserror::Error;

/// Priority of the operator-pinned static layer (consulted first).
pub const STATIC_PRIORITY: u8 = 1;
/// Priority of the proactive link-state fallback layer.
pub const LINK_STATE_PRIORITY: u8 = 10;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Install the layered routing policy on every node of the scenario:
/// an (empty) static layer at priority 1 and the link-state layer at
/// priority 10. With every node participating, end-to-end paths exist
/// from any station through the access point and across the tree.
pub fn compose(network: &mut Network) -> Result<(), ComposeError> {
    let nodes: Vec<_> = network.nodes().map(|node| node.id()).collect();
    for node in nodes {
        let mut stack = Ipv4Stack::new();
        stack.add_layer(STATIC_PRIORITY, Box::new(StaticRouting::new()))?;
        stack.add_layer(LINK_STATE_PRIORITY, Box::new(LinkStateRouting::new()))?;
        network.install_stack(node, stack)?;
    }
    Ok(())
}
