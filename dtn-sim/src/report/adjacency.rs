use crate::network::World;
use std::fmt::Write;

/// Connectivity snapshots: every `granularity` simulated seconds, a block of
///
/// ```text
/// [<t>]
/// # Node IDs: 0 1 2 ...
/// 1 0 1 ...
/// 0 1 0 ...
/// ...
/// ```
///
/// one 0/1 row per host in ascending address order. The diagonal is 1 and
/// the matrix is symmetric because connections are bidirectional.
pub struct AdjacencyMatrixReport {
    granularity: f64,
    last_snapshot: f64,
    buffer: String,
}

impl AdjacencyMatrixReport {
    pub fn new(granularity: f64) -> Self {
        Self {
            granularity,
            last_snapshot: 0.0,
            buffer: String::new(),
        }
    }

    pub fn on_tick(&mut self, world: &World, now: f64) {
        if now - self.last_snapshot < self.granularity {
            return;
        }
        self.last_snapshot = now;
        self.snapshot(world, now);
    }

    fn snapshot(&mut self, world: &World, now: f64) {
        let n = world.hosts.len();
        if n == 0 {
            return;
        }

        _ = writeln!(self.buffer, "[{}]", now as i64);

        let ids: Vec<String> = world.addresses().map(|a| a.to_string()).collect();
        _ = writeln!(self.buffer, "# Node IDs: {}", ids.join(" "));

        let mut matrix = vec![vec![0u8; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1;
        }
        for conn in world.connections.values() {
            let (a, b) = conn.endpoints();
            matrix[a.0 as usize][b.0 as usize] = 1;
            matrix[b.0 as usize][a.0 as usize] = 1;
        }

        for row in &matrix {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            _ = writeln!(self.buffer, "{}", cells.join(" "));
        }
    }

    pub fn output(&self) -> &str {
        &self.buffer
    }
}
