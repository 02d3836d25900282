use crate::{
    addressing,
    config::{MAX_STATIONS, ScenarioConfig},
    links, mobility,
    routing::{self, ComposeError},
    topology::{self, Routers, Topology},
    trace,
    traffic::{self, TrafficError},
};
use hybridsim_core::{
    Network, NodeId, SegmentId, SimError, Simulator, TopologyError,
    addressing::AddressError,
    app::AppId,
    wifi::WifiConfig,
};
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Anything that can go wrong while building or running the scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// More stations requested than the cell supports.
    #[error("{requested} stations requested, the cell supports at most {MAX_STATIONS}")]
    TooManyStations { requested: u32 },
    /// The client window must start at or after the server window so the
    /// server is listening before traffic begins.
    #[error("client window starts at {client_start:?}, before the server's {server_start:?}")]
    ClientBeforeServer {
        client_start: Duration,
        server_start: Duration,
    },
    /// The client window must end no later than the server window so no
    /// datagram is sent into a closed server.
    #[error("client window ends at {client_stop:?}, after the server's {server_stop:?}")]
    ClientOutlivesServer {
        client_stop: Duration,
        server_stop: Duration,
    },
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Traffic(#[from] TrafficError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// What the run produced, for summary reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub client_sent: u64,
    pub client_replies: u64,
    pub server_received: u64,
    /// Virtual time of the last echo reply at the client.
    pub last_reply_at: Option<Duration>,
}

/// The fully configured experiment, ready to run.
///
/// Built in stages: topology, link provisioning, mobility, address plan,
/// routing composition, traffic scheduling, trace hook. Each stage
/// depends on the completed state of the earlier ones; a failure aborts
/// construction before any later stage runs.
pub struct Scenario {
    sim: Simulator,
    routers: Routers,
    stations: Vec<NodeId>,
    point_to_point: Vec<SegmentId>,
    cell: SegmentId,
    server: AppId,
    client: Option<AppId>,
    capture_paths: Vec<PathBuf>,
}

impl Scenario {
    /// Validate `config` and build the whole scenario.
    ///
    /// Validation failures (station count above [`MAX_STATIONS`], a
    /// client window escaping the server's) are reported before any
    /// topology is constructed.
    pub fn build(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        if config.n_wifi > MAX_STATIONS {
            return Err(ScenarioError::TooManyStations {
                requested: config.n_wifi,
            });
        }
        if config.client_start < config.server_start {
            return Err(ScenarioError::ClientBeforeServer {
                client_start: config.client_start,
                server_start: config.server_start,
            });
        }
        if config.client_stop > config.server_stop {
            return Err(ScenarioError::ClientOutlivesServer {
                client_stop: config.client_stop,
                server_stop: config.server_stop,
            });
        }

        let wifi = WifiConfig::new(config.ssid.clone());
        let mut topology = topology::build(config.n_wifi, wifi)?;
        links::provision(&mut topology, config.data_rate, config.delay)?;
        mobility::assign(&mut topology)?;
        let plan = addressing::assign(&mut topology)?;
        routing::compose(&mut topology.network)?;
        log::debug!(
            "scenario built: {} nodes, {} segments, {} blocks",
            topology.network.node_count(),
            topology.network.segment_count(),
            plan.point_to_point.len() + 1,
        );

        let Topology {
            network,
            routers,
            stations,
            point_to_point,
            cell,
        } = topology;
        let mut sim = Simulator::new(network, config.seed);
        sim.set_stop(config.stop);

        let (server, client) = traffic::schedule(&mut sim, routers, &stations, config)?;

        let capture_paths = if config.tracing {
            let devices = trace::devices_to_trace(sim.network(), &point_to_point, cell)?;
            let paths = sim.enable_capture(&config.trace_prefix, &devices)?;
            log::info!("capturing on {} devices", paths.len());
            paths
        } else {
            Vec::new()
        };

        Ok(Self {
            sim,
            routers,
            stations,
            point_to_point,
            cell,
            server,
            client,
            capture_paths,
        })
    }

    /// Hand the configured state to the engine and drive the timeline
    /// to its stop time.
    pub fn run(&mut self) -> Result<RunReport, ScenarioError> {
        self.sim.run()?;

        let server = self.sim.app(self.server)?;
        let server_received = server
            .as_server()
            .map(|server| server.received())
            .unwrap_or(0);
        let (client_sent, client_replies, last_reply_at) = match self.client {
            Some(id) => {
                let client = self.sim.app(id)?;
                let client = client.as_client().ok_or(SimError::AppNotFound { app: id })?;
                (client.sent(), client.replies(), client.last_reply_at())
            }
            None => (0, 0, None),
        };

        let report = RunReport {
            client_sent,
            client_replies,
            server_received,
            last_reply_at,
        };
        log::info!(
            "run complete: client sent {}, server received {}, replies {}",
            report.client_sent,
            report.server_received,
            report.client_replies,
        );
        Ok(report)
    }

    pub fn network(&self) -> &Network {
        self.sim.network()
    }

    pub fn routers(&self) -> Routers {
        self.routers
    }

    pub fn stations(&self) -> &[NodeId] {
        &self.stations
    }

    pub fn point_to_point(&self) -> &[SegmentId] {
        &self.point_to_point
    }

    pub fn cell(&self) -> SegmentId {
        self.cell
    }

    /// The capture files opened by the trace hook, empty when tracing is
    /// off.
    pub fn capture_paths(&self) -> &[PathBuf] {
        &self.capture_paths
    }

    pub fn server(&self) -> AppId {
        self.server
    }

    pub fn client(&self) -> Option<AppId> {
        self.client
    }
}
