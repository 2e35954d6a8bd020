use crate::geometry::Coord;
use crate::map::cluster::ClusterCell;
use crate::map::room::Room;
use fastrand::Rng;

/// Draws a uniform-random coordinate inside the room by rejection sampling
/// over its bounding rectangle. Terminates with probability 1 for any room of
/// non-zero area.
pub fn random_location_in_room(room: &Room, rng: &mut Rng) -> Coord {
    let min = room.min_corner();
    loop {
        let candidate = Coord::new(
            min.x + rng.f64() * room.width(),
            min.y + rng.f64() * room.height(),
        );
        if room.contains(candidate) {
            return candidate;
        }
    }
}

/// Draws a uniform-random coordinate inside the given cluster cell (and
/// inside the room containing it).
pub fn random_location_in_cluster(room: &Room, cell: &ClusterCell, rng: &mut Rng) -> Coord {
    let origin = cell.origin();
    loop {
        let candidate = Coord::new(
            origin.x + rng.f64() * cell.size(),
            origin.y + rng.f64() * cell.size(),
        );
        if cell.contains(candidate) && room.contains(candidate) {
            return candidate;
        }
    }
}
