use hybridsim_core::{
    Network, NodeId, NodeRole, SegmentId, TopologyError,
    wifi::WifiConfig,
};

/// Handles to the six fixed endpoints of the wired tree.
///
/// `a` doubles as the wireless access point; the other five are plain
/// routers. `f` is the far leaf the traffic stage targets.
#[derive(Debug, Clone, Copy)]
pub struct Routers {
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
    pub e: NodeId,
    pub f: NodeId,
}

/// The built topology: the arena plus the handles later stages need.
pub struct Topology {
    pub network: Network,
    pub routers: Routers,
    pub stations: Vec<NodeId>,
    /// The seven point-to-point segments, in creation order.
    pub point_to_point: Vec<SegmentId>,
    pub cell: SegmentId,
}

/// Construct the fixed tree of seven point-to-point segments plus the
/// wireless cell serving `n_wifi` stations.
///
/// Tree shape: segment 1 connects `a` and `b`; segments 2-4 fan `b` out
/// to `c`, `d` and `e`; segments 5-7 join `c`, `d` and `e` back onto the
/// leaf `f`. Shared endpoints are single identities in the arena, so a
/// node keeps one device per segment it terminates.
pub fn build(n_wifi: u32, wifi: WifiConfig) -> Result<Topology, TopologyError> {
    let mut network = Network::new();

    let a = network.add_node(NodeRole::AccessPoint);
    let b = network.add_node(NodeRole::WiredRouter);
    let c = network.add_node(NodeRole::WiredRouter);
    let d = network.add_node(NodeRole::WiredRouter);
    let e = network.add_node(NodeRole::WiredRouter);
    let f = network.add_node(NodeRole::WiredRouter);

    let point_to_point = vec![
        network.connect(a, b)?,
        network.connect(b, c)?,
        network.connect(b, d)?,
        network.connect(b, e)?,
        network.connect(c, f)?,
        network.connect(d, f)?,
        network.connect(e, f)?,
    ];

    let stations: Vec<NodeId> = (0..n_wifi)
        .map(|_| network.add_node(NodeRole::Station))
        .collect();
    let cell = network.create_wireless_cell(a, &stations, wifi)?;

    Ok(Topology {
        network,
        routers: Routers { a, b, c, d, e, f },
        stations,
        point_to_point,
        cell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_and_segment_counts() {
        for n_wifi in [0, 1, 3, 18] {
            let topology = build(n_wifi, WifiConfig::default()).unwrap();
            assert_eq!(topology.network.node_count(), 6 + n_wifi as usize);
            assert_eq!(topology.point_to_point.len(), 7);
            assert_eq!(topology.network.segment_count(), 8);
            assert_eq!(topology.stations.len(), n_wifi as usize);
        }
    }

    #[test]
    fn shared_endpoints_accumulate_devices() {
        let topology = build(3, WifiConfig::default()).unwrap();
        let network = &topology.network;
        let Routers { a, b, c, d, e, f } = topology.routers;

        // b terminates segments 1-4; f terminates segments 5-7;
        // a terminates segment 1 plus the cell
        assert_eq!(network.node(b).unwrap().devices().len(), 4);
        assert_eq!(network.node(f).unwrap().devices().len(), 3);
        assert_eq!(network.node(a).unwrap().devices().len(), 2);
        for node in [c, d, e] {
            assert_eq!(network.node(node).unwrap().devices().len(), 2);
        }
        for &station in &topology.stations {
            assert_eq!(network.node(station).unwrap().devices().len(), 1);
        }
    }

    #[test]
    fn every_point_to_point_segment_has_two_endpoints() {
        let topology = build(3, WifiConfig::default()).unwrap();
        for &segment in &topology.point_to_point {
            let segment = topology.network.segment(segment).unwrap();
            assert!(segment.is_point_to_point());
            assert_eq!(segment.devices().len(), 2);
        }
        assert!(
            topology
                .network
                .segment(topology.cell)
                .unwrap()
                .is_wireless_cell()
        );
    }
}
