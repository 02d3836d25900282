use crate::topology::Topology;
use hybridsim_core::{DataRate, Delay, TopologyError};

/// Provision every point-to-point segment with the scenario's uniform
/// rate and delay. The wireless cell keeps the characteristics carried
/// by its [`WifiConfig`](hybridsim_core::wifi::WifiConfig).
pub fn provision(
    topology: &mut Topology,
    data_rate: DataRate,
    delay: Delay,
) -> Result<(), TopologyError> {
    for &segment in &topology.point_to_point {
        topology
            .network
            .configure_link(segment)
            .set_data_rate(data_rate)
            .set_delay(delay)
            .apply()?;
    }
    Ok(())
}
