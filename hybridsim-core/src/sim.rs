use crate::{
    app::{AppId, AppKind, Application, EchoClient, EchoServer},
    network::{DeviceId, Network, TopologyError},
    node::NodeId,
    packet::{Packet, PacketIdGenerator},
    time_queue::TimeQueue,
    trace::CaptureSink,
};
use rand_chacha::ChaChaRng;
use rand_core::SeedableRng;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Error raised while setting up or driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// Applications can only be installed on nodes with an IPv4 stack.
    #[error("Node {node} has no IPv4 stack; install one before applications")]
    NoStack { node: NodeId },
    /// Applications need a bound address to exchange traffic.
    #[error("Node {node} has no bound address")]
    NoAddress { node: NodeId },
    /// An application window must stop strictly after it starts.
    #[error("Application window [{start:?}, {stop:?}) is empty")]
    InvalidWindow { start: Duration, stop: Duration },
    /// The application ID was not found on this simulator.
    #[error("Application {app} not found")]
    AppNotFound { app: AppId },
    #[error("packet capture failed")]
    Capture(#[from] anyhow::Error),
}

enum Event {
    AppStart(AppId),
    AppStop(AppId),
    ClientSend(AppId),
    Deliver {
        packet: Packet,
        node: NodeId,
        /// Device the packet arrives on, for capture. `None` for local
        /// loopback delivery.
        via: Option<DeviceId>,
    },
    MobilityTick,
}

/// The discrete-event engine driving one scenario run over a built
/// [`Network`].
///
/// Virtual time only advances when the next event is popped; nothing is
/// tied to the wall clock. All randomness (mobility headings and speeds)
/// is drawn from a single seeded generator, so two runs with the same
/// inputs and seed produce identical timelines.
pub struct Simulator {
    network: Network,
    apps: Vec<Application>,
    queue: TimeQueue<Event>,
    now: Duration,
    stop_at: Duration,
    rng: ChaChaRng,
    capture: CaptureSink,
    ids: PacketIdGenerator,
}

impl Simulator {
    /// Create a simulator over `network`, seeding the randomness source
    /// with `seed`.
    pub fn new(network: Network, seed: u64) -> Self {
        Self {
            network,
            apps: Vec::new(),
            queue: TimeQueue::new(),
            now: Duration::ZERO,
            stop_at: Duration::from_secs(10),
            rng: ChaChaRng::seed_from_u64(seed),
            capture: CaptureSink::new(),
            ids: PacketIdGenerator::new(),
        }
    }

    /// Set the virtual time at which the run halts, whatever is still
    /// queued.
    pub fn set_stop(&mut self, stop_at: Duration) {
        self.stop_at = stop_at;
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn app(&self, id: AppId) -> Result<&Application, SimError> {
        self.apps
            .get(id.index())
            .ok_or(SimError::AppNotFound { app: id })
    }

    pub fn apps(&self) -> impl Iterator<Item = (AppId, &Application)> {
        self.apps
            .iter()
            .enumerate()
            .map(|(index, app)| (AppId::new(index as u32), app))
    }

    fn install(
        &mut self,
        node: NodeId,
        kind: AppKind,
        start: Duration,
        stop: Duration,
    ) -> Result<AppId, SimError> {
        if !self.network.node(node)?.has_stack() {
            return Err(SimError::NoStack { node });
        }
        if self.network.primary_address(node).is_none() {
            return Err(SimError::NoAddress { node });
        }
        if stop <= start {
            return Err(SimError::InvalidWindow { start, stop });
        }
        let id = AppId::new(self.apps.len() as u32);
        self.apps.push(Application::new(node, kind, start, stop));
        self.queue.push(start, Event::AppStart(id));
        self.queue.push(stop, Event::AppStop(id));
        Ok(id)
    }

    /// Install an echo server on `node`, active over `[start, stop)`.
    ///
    /// # Errors
    ///
    /// The node must exist, carry an IPv4 stack and a bound address, and
    /// the window must be non-empty.
    pub fn install_server(
        &mut self,
        node: NodeId,
        server: EchoServer,
        start: Duration,
        stop: Duration,
    ) -> Result<AppId, SimError> {
        self.install(node, AppKind::EchoServer(server), start, stop)
    }

    /// Install an echo client on `node`, active over `[start, stop)`.
    /// The first request goes out the moment the application starts.
    ///
    /// Subject to the same preconditions as [`Simulator::install_server`].
    pub fn install_client(
        &mut self,
        node: NodeId,
        client: EchoClient,
        start: Duration,
        stop: Duration,
    ) -> Result<AppId, SimError> {
        self.install(node, AppKind::EchoClient(client), start, stop)
    }

    /// Open capture files for the given devices under `prefix`.
    ///
    /// Returns the created file paths.
    pub fn enable_capture(
        &mut self,
        prefix: &str,
        devices: &[DeviceId],
    ) -> Result<Vec<PathBuf>, SimError> {
        let mut paths = Vec::with_capacity(devices.len());
        for &id in devices {
            let device = self.network.device(id)?;
            paths.push(self.capture.open(prefix, device)?);
        }
        Ok(paths)
    }

    /// Run the simulation until the stop time or until no events remain.
    ///
    /// The link-state tables are converged first if the scenario did not
    /// already do so.
    pub fn run(&mut self) -> Result<(), SimError> {
        if !self.network.is_converged() {
            self.network.converge_link_state();
        }
        if self
            .network
            .nodes()
            .any(|node| node.mobility().is_some() && node.position().is_some())
        {
            self.queue
                .push(crate::defaults::MOBILITY_TICK, Event::MobilityTick);
        }

        log::debug!(
            "run starting: {} nodes, {} segments, {} applications, stop at +{:?}",
            self.network.node_count(),
            self.network.segment_count(),
            self.apps.len(),
            self.stop_at
        );

        while let Some(due) = self.queue.next_due() {
            if due > self.stop_at {
                break;
            }
            let Some((at, event)) = self.queue.pop() else {
                break;
            };
            self.now = at;
            self.handle(event)?;
        }

        self.now = self.stop_at;
        self.capture.flush()?;
        log::debug!("run finished at +{:?}", self.now);
        Ok(())
    }

    fn handle(&mut self, event: Event) -> Result<(), SimError> {
        match event {
            Event::AppStart(id) => self.handle_app_start(id),
            Event::AppStop(id) => {
                let app = &mut self.apps[id.index()];
                app.set_running(false);
                log::debug!("At time +{:?} {id} on {} stopped", self.now, app.node());
                Ok(())
            }
            Event::ClientSend(id) => self.handle_client_send(id),
            Event::Deliver { packet, node, via } => self.handle_deliver(packet, node, via),
            Event::MobilityTick => self.handle_mobility_tick(),
        }
    }

    fn handle_app_start(&mut self, id: AppId) -> Result<(), SimError> {
        let app = &mut self.apps[id.index()];
        app.set_running(true);
        match app.kind() {
            AppKind::EchoServer(server) => {
                log::info!(
                    "At time +{:?} echo server on {} listening on port {}",
                    self.now,
                    app.node(),
                    server.port()
                );
            }
            AppKind::EchoClient(_) => {
                self.queue.push(self.now, Event::ClientSend(id));
            }
        }
        Ok(())
    }

    fn handle_client_send(&mut self, id: AppId) -> Result<(), SimError> {
        let app = &mut self.apps[id.index()];
        if !app.is_running() {
            return Ok(());
        }
        let node = app.node();
        let AppKind::EchoClient(client) = app.kind_mut() else {
            return Ok(());
        };
        if client.sent() >= client.max_packets() {
            return Ok(());
        }

        let destination = client.destination();
        let destination_port = client.destination_port();
        let local_port = client.local_port();
        let payload_len = client.payload_len();
        let interval = client.interval();
        client.record_sent();
        let more_to_send = client.sent() < client.max_packets();

        let source = self
            .network
            .primary_address(node)
            .ok_or(SimError::NoAddress { node })?;
        let packet = Packet::builder()
            .from(node, source, local_port)
            .to(destination, destination_port)
            .payload_len(payload_len)
            .build(&mut self.ids)?;

        log::info!(
            "At time +{:?} client on {} sent {} bytes to {} port {}",
            self.now,
            node,
            payload_len,
            destination,
            destination_port
        );
        self.forward(node, packet)?;

        if more_to_send {
            self.queue.push(self.now + interval, Event::ClientSend(id));
        }
        Ok(())
    }

    /// Move `packet` one hop onward from `from`, or queue it for local
    /// delivery when `from` owns the destination address.
    fn forward(&mut self, from: NodeId, packet: Packet) -> Result<(), SimError> {
        let Some(hop) = self.network.resolve_next_hop(from, packet.destination()) else {
            log::warn!(
                "At time +{:?} {} has no route to {}, dropping {}",
                self.now,
                from,
                packet.destination(),
                packet.id()
            );
            return Ok(());
        };
        if hop == from {
            self.queue.push(
                self.now,
                Event::Deliver {
                    packet,
                    node: from,
                    via: None,
                },
            );
            return Ok(());
        }

        let Some(segment) = self.network.segment_between(from, hop) else {
            log::warn!(
                "At time +{:?} {} has no segment towards {}, dropping {}",
                self.now,
                from,
                hop,
                packet.id()
            );
            return Ok(());
        };
        let (rate, delay) = self.network.segment(segment)?.transfer_characteristics();
        let hop_time = delay.into_duration() + rate.transmission_time(packet.wire_len());

        if let Some(device) = self.network.device_on_segment(from, segment) {
            self.capture.record(device, self.now, &packet)?;
        }
        let via = self.network.device_on_segment(hop, segment);
        self.queue.push(
            self.now + hop_time,
            Event::Deliver {
                packet,
                node: hop,
                via,
            },
        );
        Ok(())
    }

    fn handle_deliver(
        &mut self,
        packet: Packet,
        node: NodeId,
        via: Option<DeviceId>,
    ) -> Result<(), SimError> {
        if let Some(device) = via {
            self.capture.record(device, self.now, &packet)?;
        }

        // Not addressed to this node: keep forwarding.
        if self.network.node_for_address(packet.destination()) != Some(node) {
            return self.forward(node, packet);
        }

        let Some(index) = self.apps.iter().position(|app| {
            app.node() == node
                && app.is_running()
                && match app.kind() {
                    AppKind::EchoServer(server) => server.port() == packet.destination_port(),
                    AppKind::EchoClient(client) => {
                        client.local_port() == packet.destination_port()
                            && packet.source() == client.destination()
                    }
                }
        }) else {
            log::debug!(
                "At time +{:?} {} on port {} unreachable, dropping {}",
                self.now,
                node,
                packet.destination_port(),
                packet.id()
            );
            return Ok(());
        };

        let reply = match self.apps[index].kind_mut() {
            AppKind::EchoServer(server) => {
                server.record_received();
                log::info!(
                    "At time +{:?} server on {} received {} bytes from {} port {}",
                    self.now,
                    node,
                    packet.payload_len(),
                    packet.source(),
                    packet.source_port()
                );
                let reply = Packet::builder()
                    .from(node, packet.destination(), packet.destination_port())
                    .to(packet.source(), packet.source_port())
                    .payload_len(packet.payload_len())
                    .build(&mut self.ids)?;
                log::info!(
                    "At time +{:?} server on {} sent {} bytes to {} port {}",
                    self.now,
                    node,
                    reply.payload_len(),
                    reply.destination(),
                    reply.destination_port()
                );
                Some(reply)
            }
            AppKind::EchoClient(client) => {
                client.record_reply(self.now);
                log::info!(
                    "At time +{:?} client on {} received {} bytes from {} port {}",
                    self.now,
                    node,
                    packet.payload_len(),
                    packet.source(),
                    packet.source_port()
                );
                None
            }
        };
        if let Some(reply) = reply {
            self.forward(node, reply)?;
        }
        Ok(())
    }

    fn handle_mobility_tick(&mut self) -> Result<(), SimError> {
        let movers: Vec<NodeId> = self
            .network
            .nodes()
            .filter(|node| node.mobility().is_some() && node.position().is_some())
            .map(|node| node.id())
            .collect();
        for id in movers {
            let node = self.network.node(id)?;
            let (Some(mobility), Some(position)) = (node.mobility(), node.position()) else {
                continue;
            };
            let next = mobility.step(position, crate::defaults::MOBILITY_TICK, &mut self.rng);
            if next != position {
                log::trace!("At time +{:?} {} moved to {}", self.now, id, next);
            }
            self.network.update_position(id, next);
        }

        let next_tick = self.now + crate::defaults::MOBILITY_TICK;
        if next_tick <= self.stop_at {
            self.queue.push(next_tick, Event::MobilityTick);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mobility::{MobilityModel, Position, Rectangle},
        network::SegmentId,
        node::NodeRole,
        routing::{Ipv4Stack, LinkStateRouting, StaticRouting},
        wifi::WifiConfig,
    };
    use std::net::Ipv4Addr;

    fn stack() -> Ipv4Stack {
        let mut stack = Ipv4Stack::new();
        stack.add_layer(1, Box::new(StaticRouting::new())).unwrap();
        stack
            .add_layer(10, Box::new(LinkStateRouting::new()))
            .unwrap();
        stack
    }

    /// a - b - c with blocks 192.1.1.0/24 and 192.1.2.0/24.
    fn echo_pair() -> (Network, NodeId, NodeId, Ipv4Addr) {
        let mut network = Network::new();
        let a = network.add_node(NodeRole::WiredRouter);
        let b = network.add_node(NodeRole::WiredRouter);
        let c = network.add_node(NodeRole::WiredRouter);
        network.connect(a, b).unwrap();
        network.connect(b, c).unwrap();
        network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();
        let far = network
            .assign_block(SegmentId::new(1), "192.1.2.0".parse().unwrap())
            .unwrap();
        for node in [a, b, c] {
            network.install_stack(node, stack()).unwrap();
        }
        (network, a, c, far[1])
    }

    #[test]
    fn echo_round_trip() {
        let (network, client_node, server_node, server_addr) = echo_pair();
        let mut sim = Simulator::new(network, 42);
        sim.set_stop(Duration::from_secs(10));

        let server = sim
            .install_server(
                server_node,
                EchoServer::new(9),
                Duration::from_secs(1),
                Duration::from_secs(10),
            )
            .unwrap();
        let client = sim
            .install_client(
                client_node,
                EchoClient::new(server_addr, 9)
                    .set_max_packets(1)
                    .set_payload_len(1024),
                Duration::from_secs(2),
                Duration::from_secs(10),
            )
            .unwrap();

        sim.run().unwrap();

        let server = sim.app(server).unwrap().as_server().unwrap();
        let client = sim.app(client).unwrap().as_client().unwrap();
        assert_eq!(server.received(), 1);
        assert_eq!(client.sent(), 1);
        assert_eq!(client.replies(), 1);

        // two hops out, two hops back: transmission plus propagation
        let reply_at = client.last_reply_at().unwrap();
        assert!(reply_at > Duration::from_secs(2));
        assert!(reply_at < Duration::from_secs(3));
    }

    #[test]
    fn reply_timing_accounts_for_both_directions() {
        let (network, client_node, server_node, server_addr) = echo_pair();
        let mut sim = Simulator::new(network, 42);

        sim.install_server(
            server_node,
            EchoServer::new(9),
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
        .unwrap();
        let client = sim
            .install_client(
                client_node,
                EchoClient::new(server_addr, 9).set_payload_len(1024),
                Duration::from_secs(2),
                Duration::from_secs(10),
            )
            .unwrap();

        sim.run().unwrap();

        // per hop: 2ms propagation + 1052 bytes at 5mbps = 1.6832ms
        let per_hop = Duration::from_millis(2) + Duration::from_nanos(1_683_200);
        let expected = Duration::from_secs(2) + 4 * per_hop;
        let reply_at = sim.app(client).unwrap().as_client().unwrap().last_reply_at();
        assert_eq!(reply_at, Some(expected));
    }

    #[test]
    fn client_before_server_window_gets_no_reply() {
        let (network, client_node, server_node, server_addr) = echo_pair();
        let mut sim = Simulator::new(network, 42);

        // server only wakes up at 5s, client fires at 2s
        sim.install_server(
            server_node,
            EchoServer::new(9),
            Duration::from_secs(5),
            Duration::from_secs(10),
        )
        .unwrap();
        let client = sim
            .install_client(
                client_node,
                EchoClient::new(server_addr, 9),
                Duration::from_secs(2),
                Duration::from_secs(10),
            )
            .unwrap();

        sim.run().unwrap();

        let client = sim.app(client).unwrap().as_client().unwrap();
        assert_eq!(client.sent(), 1);
        assert_eq!(client.replies(), 0);
    }

    #[test]
    fn install_requires_stack_and_window() {
        let mut network = Network::new();
        let a = network.add_node(NodeRole::WiredRouter);
        let b = network.add_node(NodeRole::WiredRouter);
        network.connect(a, b).unwrap();
        network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();

        let mut sim = Simulator::new(network, 42);
        let err = sim
            .install_server(
                a,
                EchoServer::new(9),
                Duration::from_secs(1),
                Duration::from_secs(10),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::NoStack { .. }));

        let mut network = Network::new();
        let a = network.add_node(NodeRole::WiredRouter);
        let b = network.add_node(NodeRole::WiredRouter);
        network.connect(a, b).unwrap();
        network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();
        network.install_stack(a, stack()).unwrap();
        let mut sim = Simulator::new(network, 42);
        let err = sim
            .install_server(
                a,
                EchoServer::new(9),
                Duration::from_secs(10),
                Duration::from_secs(10),
            )
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidWindow { .. }));
    }

    #[test]
    fn wireless_station_reaches_wired_server() {
        let mut network = Network::new();
        let ap = network.add_node(NodeRole::AccessPoint);
        let router = network.add_node(NodeRole::WiredRouter);
        let station = network.add_node(NodeRole::Station);

        network.connect(ap, router).unwrap();
        network
            .create_wireless_cell(ap, &[station], WifiConfig::default())
            .unwrap();
        let wired = network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();
        network
            .assign_block(SegmentId::new(1), "192.2.1.0".parse().unwrap())
            .unwrap();
        for node in [ap, router, station] {
            network.install_stack(node, stack()).unwrap();
        }
        network
            .set_position(station, Position::new(0.0, 0.0))
            .unwrap();
        network
            .set_mobility(
                station,
                MobilityModel::RandomWalk2d {
                    bounds: Rectangle::new(-50.0, 50.0, -50.0, 50.0),
                },
            )
            .unwrap();

        let mut sim = Simulator::new(network, 42);
        sim.install_server(
            router,
            EchoServer::new(9),
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
        .unwrap();
        let client = sim
            .install_client(
                station,
                EchoClient::new(wired[1], 9),
                Duration::from_secs(2),
                Duration::from_secs(10),
            )
            .unwrap();

        sim.run().unwrap();

        assert_eq!(sim.app(client).unwrap().as_client().unwrap().replies(), 1);
        // the station walked somewhere during the run
        let position = sim.network().node(station).unwrap().position().unwrap();
        assert_ne!(position, Position::new(0.0, 0.0));
    }

    #[test]
    fn identical_seeds_replay_identical_walks() {
        let build = || {
            let mut network = Network::new();
            let ap = network.add_node(NodeRole::AccessPoint);
            let station = network.add_node(NodeRole::Station);
            network
                .create_wireless_cell(ap, &[station], WifiConfig::default())
                .unwrap();
            network
                .assign_block(SegmentId::new(0), "192.2.1.0".parse().unwrap())
                .unwrap();
            network
                .set_position(station, Position::new(10.0, 10.0))
                .unwrap();
            network
                .set_mobility(
                    station,
                    MobilityModel::RandomWalk2d {
                        bounds: Rectangle::new(-50.0, 50.0, -50.0, 50.0),
                    },
                )
                .unwrap();
            (network, station)
        };

        let (network, station) = build();
        let mut first = Simulator::new(network, 7);
        first.run().unwrap();
        let (network, station_again) = build();
        let mut second = Simulator::new(network, 7);
        second.run().unwrap();

        assert_eq!(
            first.network().node(station).unwrap().position(),
            second.network().node(station_again).unwrap().position(),
        );
    }
}
