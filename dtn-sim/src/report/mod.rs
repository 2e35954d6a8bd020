pub mod adjacency;
pub mod unified;

pub use adjacency::AdjacencyMatrixReport;
pub use unified::UnifiedReport;

use crate::network::{HostAddress, MessageId, World};
use std::io;
use std::path::{Path, PathBuf};

/// A message lifecycle observation, produced by the world as it runs and
/// drained into the reporters by the scheduler.
#[derive(Clone, Debug)]
pub enum ReportRecord {
    Created {
        time: f64,
        id: MessageId,
        from: HostAddress,
        to: HostAddress,
        size: u64,
    },
    Relayed {
        time: f64,
        id: MessageId,
        from: HostAddress,
        to: HostAddress,
    },
    Delivered {
        time: f64,
        id: MessageId,
        from: HostAddress,
        to: HostAddress,
        size: u64,
        hops: u32,
        latency: f64,
        path: Vec<HostAddress>,
    },
    Dropped {
        time: f64,
        id: MessageId,
        host: HostAddress,
    },
}

/// A configured report module. Output accumulates in memory and is written
/// out once at simulation end, so a run's reports are byte-deterministic.
pub enum Reporter {
    Unified(UnifiedReport),
    Adjacency(AdjacencyMatrixReport),
}

impl Reporter {
    pub fn name(&self) -> &'static str {
        match self {
            Reporter::Unified(_) => "UnifiedReport",
            Reporter::Adjacency(_) => "AdjacencyMatrixReport",
        }
    }

    pub fn on_record(&mut self, record: &ReportRecord) {
        match self {
            Reporter::Unified(r) => r.on_record(record),
            Reporter::Adjacency(_) => {}
        }
    }

    pub fn on_tick(&mut self, world: &World, now: f64) {
        match self {
            Reporter::Unified(_) => {}
            Reporter::Adjacency(r) => r.on_tick(world, now),
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Reporter::Unified(r) => r.output(),
            Reporter::Adjacency(r) => r.output(),
        }
    }

    /// Writes the buffered report to `<dir>/<scenario>_<ReportName>.txt`.
    pub fn write_to(&self, dir: &Path, scenario_name: &str) -> io::Result<PathBuf> {
        let path = dir.join(format!("{scenario_name}_{}.txt", self.name()));
        std::fs::write(&path, self.output())?;
        Ok(path)
    }
}

pub(crate) fn fmt_time(time: f64) -> String {
    format!("{time:.2}")
}
