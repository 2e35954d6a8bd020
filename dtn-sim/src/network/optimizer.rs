use crate::geometry::Coord;
use crate::network::HostAddress;
use std::collections::BTreeMap;

/// Spatial index over the stationary host locations.
///
/// Built once at scenario init with a cell size equal to the transmit range:
/// every host within range of a query location is guaranteed to be in the
/// queried cell or one of its eight neighbours. Candidates come back in
/// ascending address order so per-tick iteration is deterministic.
#[derive(Debug)]
pub struct ConnectivityGrid {
    cell_size: f64,
    cells: BTreeMap<(i64, i64), Vec<HostAddress>>,
}

impl ConnectivityGrid {
    pub fn build(locations: &[(HostAddress, Coord)], cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "grid cell size must be positive");
        let mut cells: BTreeMap<(i64, i64), Vec<HostAddress>> = BTreeMap::new();
        for &(address, location) in locations {
            cells
                .entry(cell_of(location, cell_size))
                .or_default()
                .push(address);
        }
        for bucket in cells.values_mut() {
            bucket.sort_unstable();
        }
        Self { cell_size, cells }
    }

    /// All hosts that could possibly be in range of `location`, including the
    /// host at the location itself.
    pub fn near(&self, location: Coord) -> Vec<HostAddress> {
        let (col, row) = cell_of(location, self.cell_size);
        let mut candidates = Vec::new();
        for dc in -1..=1 {
            for dr in -1..=1 {
                if let Some(bucket) = self.cells.get(&(col + dc, row + dr)) {
                    candidates.extend_from_slice(bucket);
                }
            }
        }
        candidates.sort_unstable();
        candidates
    }
}

fn cell_of(location: Coord, cell_size: f64) -> (i64, i64) {
    (
        (location.x / cell_size).floor() as i64,
        (location.y / cell_size).floor() as i64,
    )
}
