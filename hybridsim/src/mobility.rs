use crate::topology::Topology;
use hybridsim_core::{
    TopologyError,
    mobility::{GridLayout, MobilityModel, Rectangle},
};

/// Station placement grid: origin (0, 0), 5 m between columns, 10 m
/// between rows, three stations per row, filled row-major.
const GRID: GridLayout = GridLayout::new(0.0, 0.0, 5.0, 10.0, 3);

/// The rectangle station walks are confined to, centered on the origin.
const WALK_BOUNDS: Rectangle = Rectangle::new(-50.0, 50.0, -50.0, 50.0);

/// Place every station on the grid with a bounded random walk, and pin
/// the access point at the grid position after the last station.
///
/// Runs after device attachment; placing a node with no devices is a
/// construction-ordering error.
pub fn assign(topology: &mut Topology) -> Result<(), TopologyError> {
    let network = &mut topology.network;
    for (index, &station) in topology.stations.iter().enumerate() {
        network.set_position(station, GRID.position(index as u32))?;
        network.set_mobility(
            station,
            MobilityModel::RandomWalk2d {
                bounds: WALK_BOUNDS,
            },
        )?;
    }

    let ap = topology.routers.a;
    network.set_position(ap, GRID.position(topology.stations.len() as u32))?;
    network.set_mobility(ap, MobilityModel::ConstantPosition)?;
    Ok(())
}
