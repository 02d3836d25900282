//! Packet capture in pcapng format, one file per traced device.

use crate::{network::Device, packet::Packet};
use anyhow::Context;
use pcap_file::pcapng::PcapNgWriter;
use pcap_file::pcapng::blocks::enhanced_packet::EnhancedPacketBlock;
use pcap_file::pcapng::blocks::interface_description::InterfaceDescriptionBlock;
use pcap_file::pcapng::blocks::section_header::SectionHeaderBlock;
use pcap_file::{DataLink, Endianness};
use pnet_packet::ip::IpNextHeaderProtocol;
use pnet_packet::ipv4::MutableIpv4Packet;
use pnet_packet::udp::MutableUdpPacket;
use pnet_packet::{PacketSize, ipv4, udp};
use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::network::DeviceId;

/// Writes every datagram crossing a traced device to a per-device
/// capture file.
///
/// Files are named `<prefix>-<node>-<ifindex>.pcap` after the owning
/// node and the device's index on that node. The frames are synthesized
/// from the simulated envelope (the payload bytes are zero), with real
/// IPv4 and UDP headers and checksums so that standard capture tooling
/// reads them; timestamps carry the virtual clock, not wall time.
#[derive(Default)]
pub struct CaptureSink {
    captures: HashMap<DeviceId, DeviceCapture>,
}

struct DeviceCapture {
    path: PathBuf,
    writer: PcapNgWriter<BufWriter<fs::File>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a capture file for `device` under the given file name prefix.
    ///
    /// Returns the path of the created file. Opening a device twice
    /// replaces its previous (truncated) file.
    pub fn open(&mut self, prefix: &str, device: &Device) -> anyhow::Result<PathBuf> {
        let path = PathBuf::from(format!(
            "{prefix}-{}-{}.pcap",
            device.node().index(),
            device.ifindex()
        ));
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to open {} for writing", path.display()))?;

        let mut writer = PcapNgWriter::with_section_header(
            BufWriter::new(file),
            SectionHeaderBlock {
                endianness: Endianness::Big,
                major_version: 1,
                minor_version: 0,
                section_length: 0,
                options: vec![],
            },
        )
        .context("failed to write pcapng section header")?;
        writer
            .write_pcapng_block(InterfaceDescriptionBlock {
                linktype: DataLink::IPV4,
                snaplen: 65535,
                options: vec![],
            })
            .context("failed to write pcapng interface description")?;

        self.captures.insert(
            device.id(),
            DeviceCapture {
                path: path.clone(),
                writer,
            },
        );
        Ok(path)
    }

    /// Whether `device` is being traced.
    pub fn is_traced(&self, device: DeviceId) -> bool {
        self.captures.contains_key(&device)
    }

    /// The devices with open capture files.
    pub fn traced_devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.captures.keys().copied()
    }

    /// Record `packet` crossing `device` at virtual time `now`.
    ///
    /// Devices without an open capture file are skipped silently, so the
    /// forwarding path can call this unconditionally.
    pub fn record(
        &mut self,
        device: DeviceId,
        now: Duration,
        packet: &Packet,
    ) -> anyhow::Result<()> {
        let Some(capture) = self.captures.get_mut(&device) else {
            return Ok(());
        };

        let frame = synthesize_frame(packet)?;
        capture
            .writer
            .write_pcapng_block(EnhancedPacketBlock {
                interface_id: 0,
                timestamp: block_timestamp(now),
                original_len: frame.len() as u32,
                data: frame.into(),
                options: Vec::new(),
            })
            .with_context(|| format!("failed to write frame to {}", capture.path.display()))?;
        Ok(())
    }

    /// Flush every open capture file.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        for capture in self.captures.values_mut() {
            capture
                .writer
                .get_mut()
                .flush()
                .with_context(|| format!("failed to flush {}", capture.path.display()))?;
        }
        Ok(())
    }
}

/// Build the on-wire IPv4/UDP frame for a simulated datagram. The
/// payload is all zeroes of the recorded length.
fn synthesize_frame(packet: &Packet) -> anyhow::Result<Vec<u8>> {
    let payload_len = packet.payload_len() as usize;
    let mut buffer = vec![0; 20 + 8 + payload_len];

    let udp_packet_length = 8 + payload_len as u16;
    {
        let mut udp_writer = MutableUdpPacket::new(&mut buffer[20..])
            .context("frame buffer too small for UDP header")?;
        udp_writer.set_source(packet.source_port());
        udp_writer.set_destination(packet.destination_port());
        udp_writer.set_length(udp_packet_length);
        let checksum = udp::ipv4_checksum(
            &udp_writer.to_immutable(),
            &packet.source(),
            &packet.destination(),
        );
        udp_writer.set_checksum(checksum);
    }

    let buffer_len = buffer.len();
    let mut ip_writer =
        MutableIpv4Packet::new(&mut buffer).context("frame buffer too small for IPv4 header")?;
    ip_writer.set_version(4);
    ip_writer.set_header_length(5); // no options
    ip_writer.set_dscp(0);
    ip_writer.set_ecn(0);
    ip_writer.set_identification(0); // we never fragment
    ip_writer.set_flags(0b010);
    ip_writer.set_fragment_offset(0);
    ip_writer.set_ttl(64);
    ip_writer.set_next_level_protocol(IpNextHeaderProtocol::new(17)); // UDP
    ip_writer.set_source(packet.source());
    ip_writer.set_destination(packet.destination());
    ip_writer.set_total_length(20 + udp_packet_length);
    let checksum = ipv4::checksum(&ip_writer.to_immutable());
    ip_writer.set_checksum(checksum);
    // packet_size() covers header and payload, i.e. the whole frame
    debug_assert_eq!(ip_writer.packet_size(), buffer_len);
    drop(ip_writer);

    buffer.truncate(20 + udp_packet_length as usize);
    Ok(buffer)
}

fn block_timestamp(now: Duration) -> Duration {
    // The writer scales seconds by 1000 when encoding timestamps, so
    // pre-divide to land on the right wire value.
    Duration::from_secs_f64(now.as_secs_f64() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        network::{Network, SegmentId},
        node::NodeRole,
        packet::{Packet, PacketIdGenerator},
    };
    use std::net::Ipv4Addr;

    fn sample_packet() -> Packet {
        let mut network = Network::new();
        let a = network.add_node(NodeRole::WiredRouter);
        let b = network.add_node(NodeRole::WiredRouter);
        network.connect(a, b).unwrap();
        let addresses = network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();

        let mut ids = PacketIdGenerator::new();
        Packet::builder()
            .from(a, addresses[0], 49153)
            .to(addresses[1], 9)
            .payload_len(1024)
            .build(&mut ids)
            .unwrap()
    }

    #[test]
    fn frame_carries_envelope() {
        let packet = sample_packet();
        let frame = synthesize_frame(&packet).unwrap();

        // IPv4 total length: payload + 28 bytes of headers
        assert_eq!(frame.len(), 1024 + 28);
        assert_eq!(frame[0] >> 4, 4); // version
        assert_eq!(frame[9], 17); // protocol = UDP
        assert_eq!(&frame[12..16], &Ipv4Addr::new(192, 1, 1, 1).octets());
        assert_eq!(&frame[16..20], &Ipv4Addr::new(192, 1, 1, 2).octets());
        // UDP ports, big endian
        assert_eq!(u16::from_be_bytes([frame[20], frame[21]]), 49153);
        assert_eq!(u16::from_be_bytes([frame[22], frame[23]]), 9);
    }

    #[test]
    fn capture_files_are_created_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("trace").display().to_string();

        let mut network = Network::new();
        let a = network.add_node(NodeRole::WiredRouter);
        let b = network.add_node(NodeRole::WiredRouter);
        network.connect(a, b).unwrap();
        network
            .assign_block(SegmentId::new(0), "192.1.1.0".parse().unwrap())
            .unwrap();

        let mut sink = CaptureSink::new();
        let device = network.node(a).unwrap().devices()[0];
        let path = sink
            .open(&prefix, network.device(device).unwrap())
            .unwrap();
        assert!(path.to_string_lossy().ends_with("trace-0-0.pcap"));

        let packet = sample_packet();
        sink.record(device, Duration::from_secs(2), &packet).unwrap();
        sink.flush().unwrap();

        let written = std::fs::metadata(&path).unwrap().len();
        assert!(written > 1024);
    }

    #[test]
    fn untraced_devices_are_skipped() {
        let mut sink = CaptureSink::new();
        let packet = sample_packet();
        // no file opened for this device
        sink.record(DeviceId::new(7), Duration::ZERO, &packet)
            .unwrap();
        assert!(!sink.is_traced(DeviceId::new(7)));
    }
}
