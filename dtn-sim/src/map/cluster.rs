use crate::error::ConfigError;
use crate::geometry::Coord;
use crate::map::room::Room;

/// A square cell of the cluster grid, identified by a stable integer id.
///
/// Cells are enumerated over the room's bounding box (row-major, starting at
/// the configured offset); only cells whose NW and SE corners both lie inside
/// the polygon are valid, and the id-th valid cell belongs to cluster id.
#[derive(Clone, Debug)]
pub struct ClusterCell {
    pub id: u32,
    origin: Coord,
    size: f64,
    max_cardinality: u32,
}

impl ClusterCell {
    pub fn place(
        id: u32,
        max_cardinality: u32,
        size: f64,
        room: &Room,
        offset_x: f64,
        offset_y: f64,
    ) -> Result<Self, ConfigError> {
        let columns = (room.width() / size) as u32;
        let rows = (room.height() / size) as u32;

        let mut valid = Vec::new();
        for row in 0..rows {
            for col in 0..columns {
                let origin = Coord::new(
                    offset_x + col as f64 * size,
                    offset_y + row as f64 * size,
                );
                let opposite = Coord::new(origin.x + size, origin.y + size);
                if room.contains(origin) && room.contains(opposite) {
                    valid.push(origin);
                }
            }
        }

        let Some(&origin) = valid.get(id as usize) else {
            return Err(ConfigError::ClusterOutOfRange {
                id,
                available: valid.len(),
            });
        };

        Ok(Self {
            id,
            origin,
            size,
            max_cardinality,
        })
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn max_cardinality(&self) -> u32 {
        self.max_cardinality
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= self.origin.x
            && coord.x <= self.origin.x + self.size
            && coord.y >= self.origin.y
            && coord.y <= self.origin.y + self.size
    }
}
