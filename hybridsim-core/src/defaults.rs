//! Default values used through the simulation when no specific
//! configuration is given.

use crate::measure::{DataRate, Delay};
use std::time::Duration;

/// Default transmission rate of a point-to-point segment.
pub const DEFAULT_DATA_RATE: DataRate = DataRate::new(5_000_000);

/// Default one-way propagation delay of a point-to-point segment.
pub const DEFAULT_DELAY: Delay = Delay::new(Duration::from_millis(2));

/// Default converged transmission rate inside a wireless cell.
pub const DEFAULT_WIFI_DATA_RATE: DataRate = DataRate::new(54_000_000);

/// Default in-cell propagation delay. Radio propagation over tens of
/// meters is on the microsecond scale.
pub const DEFAULT_WIFI_DELAY: Delay = Delay::new(Duration::from_micros(1));

/// Default network name of a wireless cell.
pub const DEFAULT_SSID: &str = "hybridsim-cell";

/// Well-known echo port.
pub const DEFAULT_ECHO_PORT: u16 = 9;

/// Source port the echo client binds to.
pub const CLIENT_EPHEMERAL_PORT: u16 = 49153;

/// IPv4 header (20 bytes) plus UDP header (8 bytes), added to every
/// payload when computing transmission time and capture frames.
pub const IPV4_UDP_HEADER_LEN: u64 = 28;

/// Interval at which mobility models are stepped.
pub const MOBILITY_TICK: Duration = Duration::from_secs(1);
