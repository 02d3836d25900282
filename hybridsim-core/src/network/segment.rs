use crate::{
    measure::{DataRate, Delay},
    network::DeviceId,
    wifi::WifiConfig,
};
use std::fmt;

/// The identifier of a segment in the [`Network`] arena.
///
/// [`Network`]: crate::network::Network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(u32);

impl SegmentId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg{}", self.0)
    }
}

/// One network segment: a point-to-point link between exactly two devices,
/// or a wireless cell with exactly one access point and any number of
/// stations.
pub enum Segment {
    PointToPoint {
        /// The two endpoint devices, in installation order.
        devices: [DeviceId; 2],
        data_rate: DataRate,
        delay: Delay,
    },
    WirelessCell {
        /// The access point's wireless device.
        ap: DeviceId,
        /// Station devices, in installation order.
        stations: Vec<DeviceId>,
        config: WifiConfig,
    },
}

impl Segment {
    /// Every device on this segment, in installation order.
    ///
    /// For a wireless cell the access point comes first, matching the
    /// order addresses are bound in.
    pub fn devices(&self) -> Vec<DeviceId> {
        match self {
            Segment::PointToPoint { devices, .. } => devices.to_vec(),
            Segment::WirelessCell { ap, stations, .. } => {
                let mut all = Vec::with_capacity(1 + stations.len());
                all.push(*ap);
                all.extend_from_slice(stations);
                all
            }
        }
    }

    /// The `(data_rate, delay)` pair governing one hop across this segment.
    pub fn transfer_characteristics(&self) -> (DataRate, Delay) {
        match self {
            Segment::PointToPoint {
                data_rate, delay, ..
            } => (*data_rate, *delay),
            Segment::WirelessCell { config, .. } => (config.effective_rate(), config.delay),
        }
    }

    pub fn is_point_to_point(&self) -> bool {
        matches!(self, Segment::PointToPoint { .. })
    }

    pub fn is_wireless_cell(&self) -> bool {
        matches!(self, Segment::WirelessCell { .. })
    }

    /// The cell configuration, for wireless segments.
    pub fn wifi_config(&self) -> Option<&WifiConfig> {
        match self {
            Segment::PointToPoint { .. } => None,
            Segment::WirelessCell { config, .. } => Some(config),
        }
    }
}
