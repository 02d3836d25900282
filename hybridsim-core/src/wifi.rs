use crate::measure::{DataRate, Delay};
use std::fmt;

/// The network name shared by every device of one wireless cell.
///
/// Stations only associate with an access point carrying the same `Ssid`,
/// so two cells with different names never exchange traffic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ssid(String);

impl Ssid {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rate-control policy for the MAC layers of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateControl {
    /// Adapt the transmission rate to observed conditions (the default).
    ///
    /// The adaptation algorithm itself belongs to the PHY model; the
    /// simulation uses the cell's configured [`DataRate`] as the converged
    /// rate.
    #[default]
    Adaptive,
    /// Transmit at a fixed rate regardless of conditions.
    Fixed(DataRate),
}

/// The MAC role of one wireless device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacRole {
    /// Coordinator of the cell.
    AccessPoint,
    /// Mobile client. `active_probing` controls whether the station
    /// broadcasts probe requests while scanning for its cell.
    Station { active_probing: bool },
}

/// Typed configuration of a wireless cell.
///
/// This replaces the stringly-typed attribute configuration of classical
/// simulators: every parameter is validated by construction. The default
/// propagation and error models are represented by the cell-level
/// `data_rate`/`delay` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct WifiConfig {
    pub ssid: Ssid,
    pub rate_control: RateControl,
    /// The rate used for in-cell transmissions.
    pub data_rate: DataRate,
    /// In-cell propagation delay.
    pub delay: Delay,
    /// Whether stations probe actively while scanning.
    pub active_probing: bool,
}

impl WifiConfig {
    pub fn new(ssid: Ssid) -> Self {
        Self {
            ssid,
            rate_control: RateControl::Adaptive,
            data_rate: crate::defaults::DEFAULT_WIFI_DATA_RATE,
            delay: crate::defaults::DEFAULT_WIFI_DELAY,
            active_probing: false,
        }
    }

    /// The rate in-cell transmissions are modeled at.
    ///
    /// For [`RateControl::Adaptive`] this is the cell's configured rate
    /// (the converged state of the adaptation); for [`RateControl::Fixed`]
    /// it is the pinned rate.
    pub fn effective_rate(&self) -> DataRate {
        match self.rate_control {
            RateControl::Adaptive => self.data_rate,
            RateControl::Fixed(rate) => rate,
        }
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self::new(Ssid::new(crate::defaults::DEFAULT_SSID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WifiConfig::default();
        assert_eq!(config.ssid.as_str(), crate::defaults::DEFAULT_SSID);
        assert_eq!(config.rate_control, RateControl::Adaptive);
        assert!(!config.active_probing);
    }

    #[test]
    fn effective_rate_follows_policy() {
        let mut config = WifiConfig::default();
        assert_eq!(config.effective_rate(), config.data_rate);

        let pinned = DataRate::new(6_000_000);
        config.rate_control = RateControl::Fixed(pinned);
        assert_eq!(config.effective_rate(), pinned);
    }
}
