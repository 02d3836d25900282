use hybridsim_core::{
    DataRate, Delay,
    wifi::Ssid,
};
use std::time::Duration;

/// Maximum number of stations the cell's placement grid accommodates.
pub const MAX_STATIONS: u32 = 18;

/// Everything the scenario can be parameterized with. Every field has a
/// default matching the fixed reference experiment; the CLI only exposes
/// the interesting knobs.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of wireless station nodes, at most [`MAX_STATIONS`].
    pub n_wifi: u32,
    /// Log application-level events during the run.
    pub verbose: bool,
    /// Write per-device pcap capture files.
    pub tracing: bool,
    /// File name prefix of the capture files.
    pub trace_prefix: String,
    /// Seed of the run's randomness source (mobility).
    pub seed: u64,
    /// Transmission rate of every point-to-point segment.
    pub data_rate: DataRate,
    /// Propagation delay of every point-to-point segment.
    pub delay: Delay,
    /// Network name of the wireless cell.
    pub ssid: Ssid,
    /// Which station runs the echo client. Defaults to the last one.
    pub client_station: Option<u32>,
    /// Echo requests the client sends.
    pub max_packets: u64,
    /// Pause between consecutive echo requests.
    pub interval: Duration,
    /// Echo request payload size in bytes.
    pub payload_len: u64,
    /// Server active window.
    pub server_start: Duration,
    pub server_stop: Duration,
    /// Client active window. Must start at or after the server's.
    pub client_start: Duration,
    pub client_stop: Duration,
    /// Global virtual-time stop.
    pub stop: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            n_wifi: 3,
            verbose: true,
            tracing: false,
            trace_prefix: "hybrid".to_string(),
            seed: 42,
            data_rate: DataRate::new(5_000_000),
            delay: Delay::new(Duration::from_millis(2)),
            ssid: Ssid::new("hybridsim-cell"),
            client_station: None,
            max_packets: 1,
            interval: Duration::from_secs(1),
            payload_len: 1024,
            server_start: Duration::from_secs(1),
            server_stop: Duration::from_secs(10),
            client_start: Duration::from_secs(2),
            client_stop: Duration::from_secs(10),
            stop: Duration::from_secs(10),
        }
    }
}

impl ScenarioConfig {
    /// Index of the station running the echo client, if any station
    /// exists.
    pub fn client_station(&self) -> Option<u32> {
        if self.n_wifi == 0 {
            return None;
        }
        Some(self.client_station.unwrap_or(self.n_wifi - 1))
    }
}
