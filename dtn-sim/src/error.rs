use crate::network::{ConnectionId, HostAddress};
use std::path::PathBuf;
use thiserror::Error;

/// A scenario that cannot be built. Fatal before the first tick.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required setting `{0}`")]
    MissingKey(String),
    #[error("setting `{key}` has invalid value `{value}` (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("unknown {kind} class `{name}`")]
    UnknownClass { kind: &'static str, name: String },
    #[error("room polygon has {0} vertices, need at least 3")]
    DegeneratePolygon(usize),
    #[error("ray-cast origin ({x}, {y}) lies inside the room's bounding box")]
    InteriorRayOrigin { x: f64, y: f64 },
    #[error("cannot place cluster {id}: only {available} grid cells fit inside the room")]
    ClusterOutOfRange { id: u32, available: usize },
    #[error("cluster layout mismatch: {clusters} clusters x {hosts_per_cluster} hosts per cluster != {hosts} hosts")]
    ClusterArithmetic {
        clusters: u32,
        hosts_per_cluster: u32,
        hosts: u32,
    },
    #[error("host address range {start},{end} is empty or out of bounds (have {hosts} hosts)")]
    BadHostRange { start: u32, end: u32, hosts: u32 },
    #[error("exactly one interface per host is supported, scenario configures {0}")]
    InterfaceCount(u32),
}

/// A runtime precondition violated mid-simulation. Fatal; the event trace up
/// to the violation is still flushed by the driver.
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("connection {connection} already has a transfer in flight, cannot start another")]
    TransferInFlight { connection: ConnectionId },
    #[error("asymmetric connection state between hosts {a} and {b}")]
    AsymmetricConnection { a: HostAddress, b: HostAddress },
    #[error("host {host} buffer over capacity: {used} of {capacity} bytes")]
    BufferOverCapacity {
        host: HostAddress,
        used: u64,
        capacity: u64,
    },
}
