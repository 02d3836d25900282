use hybridsim_core::{DeviceId, Network, SegmentId, TopologyError};

/// The devices the trace hook captures on: every endpoint of the seven
/// point-to-point segments plus the access point's wireless device.
/// Station devices are not traced.
pub fn devices_to_trace(
    network: &Network,
    point_to_point: &[SegmentId],
    cell: SegmentId,
) -> Result<Vec<DeviceId>, TopologyError> {
    let mut devices = Vec::new();
    for &segment in point_to_point {
        devices.extend(network.segment(segment)?.devices());
    }
    // cell device order puts the access point first
    if let Some(&ap_device) = network.segment(cell)?.devices().first() {
        devices.push(ap_device);
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology;
    use hybridsim_core::wifi::WifiConfig;

    #[test]
    fn fifteen_devices_for_the_fixed_scenario() {
        let topology = topology::build(3, WifiConfig::default()).unwrap();
        let devices =
            devices_to_trace(&topology.network, &topology.point_to_point, topology.cell).unwrap();

        // 7 segments x 2 endpoints + the access point's wireless device
        assert_eq!(devices.len(), 15);

        let ap_wireless = *devices.last().unwrap();
        let device = topology.network.device(ap_wireless).unwrap();
        assert_eq!(device.node(), topology.routers.a);
        assert_eq!(device.segment(), topology.cell);
    }
}
