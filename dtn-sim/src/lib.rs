//! Discrete-event simulator for a delay-tolerant wireless network of
//! stationary nodes talking over a short-range, Bluetooth-LE-like radio.
//!
//! A [`scenario::Scenario`] is built from key/value [`settings::Settings`]
//! and owns everything a run needs: polygon rooms, placed hosts, the
//! workload generator and the configured reporters. [`sim::Simulation::run`]
//! then advances simulation time by interleaving externally scheduled
//! message creations with a fixed-interval tick that drives neighbour
//! discovery, chunked transfers and routing. Runs with the same seed are
//! byte-for-byte reproducible.

pub mod error;
pub mod geometry;
pub mod map;
pub mod network;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod settings;
pub mod sim;
pub mod stats;

pub use error::{ConfigError, ScenarioError};
pub use scenario::Scenario;
pub use settings::Settings;
pub use sim::Simulation;
pub use stats::SimulationStats;
