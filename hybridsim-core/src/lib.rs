//! Core engine of the hybrid wired/wireless network simulator.
//!
//! The crate is split along the scenario/engine seam:
//!
//! * the [`network`] arena owns the topology — nodes, devices, segments,
//!   the address plan and the converged link-state tables;
//! * [`routing`] composes per-node resolution strategies into prioritised
//!   layers;
//! * [`sim`] drives the whole thing on a virtual clock, delivering
//!   datagrams hop by hop between the [`app`] endpoints;
//! * [`trace`] writes pcapng capture files for the devices a scenario
//!   chooses to observe.
//!
//! Scenario crates build a [`Network`], install applications on a
//! [`Simulator`](sim::Simulator) and call
//! [`run`](sim::Simulator::run); everything is deterministic for a given
//! seed.

pub mod addressing;
pub mod app;
pub mod defaults;
pub mod measure;
pub mod mobility;
pub mod network;
pub mod node;
pub mod packet;
pub mod routing;
pub mod sim;
mod time_queue;
pub mod trace;
pub mod wifi;

pub use self::{
    measure::{DataRate, Delay},
    network::{DeviceId, Network, Segment, SegmentId, TopologyError},
    node::{Node, NodeId, NodeRole},
    sim::{SimError, Simulator},
    time_queue::TimeQueue,
};
