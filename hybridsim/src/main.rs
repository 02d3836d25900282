use anyhow::Context;
use clap::{ArgAction, Parser};
use hybridsim::{Scenario, ScenarioConfig};
use hybridsim_core::{DataRate, Delay, wifi::Ssid};

/// Hybrid wired/wireless echo experiment: seven point-to-point links in
/// a tree, one infrastructure wifi cell, layered static + link-state
/// routing, one UDP echo exchange end to end.
#[derive(Parser)]
#[command(name = "hybridsim", version)]
struct Args {
    /// Number of wireless station nodes (at most 18)
    #[arg(long = "n-wifi", default_value_t = 3)]
    n_wifi: u32,

    /// Log application-level events during the run
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    verbose: bool,

    /// Write per-device pcap capture files
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    tracing: bool,

    /// File name prefix of the capture files
    #[arg(long, default_value = "hybrid")]
    trace_prefix: String,

    /// Seed of the run's randomness source (station mobility)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Transmission rate of the point-to-point links
    #[arg(long, default_value = "5mbps")]
    data_rate: DataRate,

    /// Propagation delay of the point-to-point links
    #[arg(long, default_value = "2ms")]
    delay: Delay,

    /// Network name of the wireless cell
    #[arg(long, default_value = "hybridsim-cell")]
    ssid: String,

    /// Station index running the echo client (defaults to the last one)
    #[arg(long)]
    client_station: Option<u32>,
}

impl Args {
    fn into_config(self) -> ScenarioConfig {
        ScenarioConfig {
            n_wifi: self.n_wifi,
            verbose: self.verbose,
            tracing: self.tracing,
            trace_prefix: self.trace_prefix,
            seed: self.seed,
            data_rate: self.data_rate,
            delay: self.delay,
            ssid: Ssid::new(self.ssid),
            client_station: self.client_station,
            ..ScenarioConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .init();

    let config = args.into_config();
    let mut scenario = Scenario::build(&config).context("failed to build the scenario")?;
    let report = scenario.run().context("simulation run failed")?;

    if config.n_wifi > 0 && report.client_replies == 0 {
        log::warn!("the echo request got no reply before the stop time");
    }
    for path in scenario.capture_paths() {
        log::info!("capture written to {}", path.display());
    }
    Ok(())
}
