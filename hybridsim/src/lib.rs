//! A fixed hybrid wired/wireless experiment over the
//! [`hybridsim_core`] engine.
//!
//! The scenario wires seven point-to-point segments into a tree,
//! attaches an infrastructure wireless cell to one end, overlays a
//! static-plus-link-state routing policy on every node, and probes
//! end-to-end reachability with a single UDP echo exchange from a
//! mobile station to the far leaf of the tree.
//!
//! ```no_run
//! use hybridsim::{Scenario, ScenarioConfig};
//!
//! let config = ScenarioConfig::default();
//! let mut scenario = Scenario::build(&config)?;
//! let report = scenario.run()?;
//! assert_eq!(report.client_replies, 1);
//! # Ok::<(), hybridsim::ScenarioError>(())
//! ```

pub mod addressing;
pub mod config;
pub mod links;
pub mod mobility;
pub mod routing;
pub mod scenario;
pub mod topology;
pub mod trace;
pub mod traffic;

pub use self::{
    config::{MAX_STATIONS, ScenarioConfig},
    scenario::{RunReport, Scenario, ScenarioError},
    topology::{Routers, Topology},
};
