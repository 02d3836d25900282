use crate::{config::ScenarioConfig, topology::Routers};
use hybridsim_core::{
    NodeId, SimError, Simulator,
    app::{AppId, EchoClient, EchoServer},
    defaults::DEFAULT_ECHO_PORT,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrafficError {
    /// The requested client station index does not exist.
    #[error("Station index {index} out of range, only {available} stations exist")]
    StationOutOfRange { index: u32, available: u32 },
    /// The echo server's node ended up without an address.
    #[error("Server node {node} has no bound address")]
    ServerUnaddressed { node: NodeId },
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Install the echo pair: the server on the far leaf `f`, the client on
/// the configured station, windows per the scenario timeline.
///
/// With no stations there is nothing to probe from; the server is still
/// installed and the run simply carries no traffic.
pub fn schedule(
    sim: &mut Simulator,
    routers: Routers,
    stations: &[NodeId],
    config: &ScenarioConfig,
) -> Result<(AppId, Option<AppId>), TrafficError> {
    let server_node = routers.f;
    let server_address = sim
        .network()
        .primary_address(server_node)
        .ok_or(TrafficError::ServerUnaddressed { node: server_node })?;
    let server = sim.install_server(
        server_node,
        EchoServer::new(DEFAULT_ECHO_PORT),
        config.server_start,
        config.server_stop,
    )?;

    let Some(index) = config.client_station() else {
        log::warn!("no stations in the cell, skipping the echo client");
        return Ok((server, None));
    };
    let Some(&client_node) = stations.get(index as usize) else {
        return Err(TrafficError::StationOutOfRange {
            index,
            available: stations.len() as u32,
        });
    };

    let client = sim.install_client(
        client_node,
        EchoClient::new(server_address, DEFAULT_ECHO_PORT)
            .set_max_packets(config.max_packets)
            .set_interval(config.interval)
            .set_payload_len(config.payload_len),
        config.client_start,
        config.client_stop,
    )?;
    Ok((server, Some(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{addressing, routing, topology};
    use hybridsim_core::wifi::WifiConfig;
    use std::net::Ipv4Addr;

    fn simulator(n_wifi: u32) -> (Simulator, Routers, Vec<NodeId>) {
        let mut topology = topology::build(n_wifi, WifiConfig::default()).unwrap();
        addressing::assign(&mut topology).unwrap();
        routing::compose(&mut topology.network).unwrap();
        (
            Simulator::new(topology.network, 42),
            topology.routers,
            topology.stations,
        )
    }

    #[test]
    fn server_and_client_target_each_other() {
        let (mut sim, routers, stations) = simulator(3);
        let config = ScenarioConfig::default();
        let (server, client) = schedule(&mut sim, routers, &stations, &config).unwrap();

        let server = sim.app(server).unwrap();
        assert_eq!(server.node(), routers.f);
        assert_eq!(server.as_server().unwrap().port(), 9);

        let client = sim.app(client.unwrap()).unwrap();
        assert_eq!(client.node(), stations[2]);
        let client = client.as_client().unwrap();
        assert_eq!(client.destination(), Ipv4Addr::new(192, 1, 5, 2));
        assert_eq!(client.destination_port(), 9);
        assert_eq!(client.max_packets(), 1);
        assert_eq!(client.payload_len(), 1024);
    }

    #[test]
    fn client_window_starts_inside_server_window() {
        let (mut sim, routers, stations) = simulator(3);
        let config = ScenarioConfig::default();
        let (server, client) = schedule(&mut sim, routers, &stations, &config).unwrap();

        let server = sim.app(server).unwrap();
        let client = sim.app(client.unwrap()).unwrap();
        assert!(client.start() >= server.start());
        assert!(client.stop() <= server.stop());
    }

    #[test]
    fn no_stations_skips_the_client() {
        let (mut sim, routers, stations) = simulator(0);
        let config = ScenarioConfig {
            n_wifi: 0,
            ..ScenarioConfig::default()
        };
        let (_, client) = schedule(&mut sim, routers, &stations, &config).unwrap();
        assert!(client.is_none());
    }

    #[test]
    fn out_of_range_station_rejected() {
        let (mut sim, routers, stations) = simulator(2);
        let config = ScenarioConfig {
            n_wifi: 2,
            client_station: Some(5),
            ..ScenarioConfig::default()
        };
        let err = schedule(&mut sim, routers, &stations, &config).unwrap_err();
        assert!(matches!(
            err,
            TrafficError::StationOutOfRange {
                index: 5,
                available: 2
            }
        ));
    }
}
