use crate::error::ConfigError;
use crate::geometry::{Coord, Segment};
use std::path::Path;
use tracing::warn;

/// A polygon room. The vertex ring is closed implicitly (last connects back
/// to first) and assumed non-self-intersecting.
#[derive(Clone, Debug)]
pub struct Room {
    polygon: Vec<Coord>,
    /// Origin of the containment ray. Proven exterior at construction.
    ray_origin: Coord,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Room {
    /// Builds a room from a vertex ring, deriving an exterior ray origin from
    /// the bounding box.
    pub fn new(polygon: Vec<Coord>) -> Result<Self, ConfigError> {
        if polygon.len() < 3 {
            return Err(ConfigError::DegeneratePolygon(polygon.len()));
        }

        let min_x = polygon.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let min_y = polygon.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
        let max_x = polygon.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = polygon.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            polygon,
            ray_origin: Coord::new(min_x - 1.0, min_y - 1.0),
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Builds a room with a caller-chosen ray origin. The origin must lie
    /// outside the polygon's bounding box; an interior origin flips every
    /// containment answer.
    pub fn with_ray_origin(polygon: Vec<Coord>, origin: Coord) -> Result<Self, ConfigError> {
        let mut room = Self::new(polygon)?;
        let inside_bounds = (room.min_x..=room.max_x).contains(&origin.x)
            && (room.min_y..=room.max_y).contains(&origin.y);
        if inside_bounds {
            return Err(ConfigError::InteriorRayOrigin {
                x: origin.x,
                y: origin.y,
            });
        }
        room.ray_origin = origin;
        Ok(room)
    }

    /// Builds an axis-aligned rectangular room spanning (0, 0) to (w, h).
    pub fn rectangle(width: f64, height: f64) -> Result<Self, ConfigError> {
        Self::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(width, 0.0),
            Coord::new(width, height),
            Coord::new(0.0, height),
        ])
    }

    /// Reads a room from a WKT-style text file: every line is expected to
    /// contain one parenthesized `(x y)` pair, surrounding text is ignored.
    /// Lines without a parseable pair are skipped with a warning.
    pub fn from_wkt_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut polygon = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            match parse_wkt_coord(line) {
                Some(coord) => polygon.push(coord),
                None if line.trim().is_empty() => {}
                None => warn!(
                    "skipping malformed line {} of `{}`: {line:?}",
                    number + 1,
                    path.display()
                ),
            }
        }
        Self::new(polygon)
    }

    pub fn polygon(&self) -> &[Coord] {
        &self.polygon
    }

    pub fn min_corner(&self) -> Coord {
        Coord::new(self.min_x, self.min_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Ray-cast containment with the even/odd rule. Crossings are counted as
    /// *distinct* intersection points so that a ray passing through a shared
    /// vertex of two edges counts once, not twice.
    pub fn contains(&self, coord: Coord) -> bool {
        let ray = Segment::new(self.ray_origin, coord);

        let mut hits: Vec<Coord> = Vec::new();
        for edge in self.edges() {
            let Some(hit) = ray.intersection(&edge) else {
                continue;
            };
            let duplicate = hits
                .iter()
                .any(|seen| (seen.x - hit.x).abs() < 1e-9 && (seen.y - hit.y).abs() < 1e-9);
            if !duplicate {
                hits.push(hit);
            }
        }

        hits.len() % 2 == 1
    }

    /// True iff the segment between the two coordinates crosses any edge of
    /// this room's polygon.
    pub fn crosses(&self, from: Coord, to: Coord) -> bool {
        let line = Segment::new(from, to);
        self.edges().any(|edge| line.intersects(&edge))
    }

    fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.polygon.len();
        (0..n).map(move |i| Segment::new(self.polygon[i], self.polygon[(i + 1) % n]))
    }
}

/// Extracts the `(x y)` pair from a single WKT-ish line, rounding the
/// coordinates to millimeters.
fn parse_wkt_coord(line: &str) -> Option<Coord> {
    let open = line.find('(')?;
    let close = line[open..].find(')')? + open;
    let mut tokens = line[open + 1..close].split_whitespace();
    let x: f64 = tokens.next()?.parse().ok()?;
    let y: f64 = tokens.next()?.parse().ok()?;
    Some(Coord::new(round_mm(x), round_mm(y)))
}

fn round_mm(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Room {
        Room::rectangle(100.0, 100.0).unwrap()
    }

    #[test]
    fn contains_interior_point() {
        assert!(square().contains(Coord::new(50.0, 50.0)));
    }

    #[test]
    fn excludes_exterior_point() {
        assert!(!square().contains(Coord::new(150.0, 50.0)));
        assert!(!square().contains(Coord::new(-1.0, -1.0)));
    }

    #[test]
    fn ray_through_shared_vertex_counts_once() {
        // The default ray origin is (-1, -1); a query along the diagonal sends
        // the ray straight through the corner vertex at (0, 0), which belongs
        // to two edges.
        assert!(square().contains(Coord::new(50.0, 50.0)));
        assert!(square().contains(Coord::new(2.0, 2.0)));
    }

    #[test]
    fn l_shaped_room_concave_region_is_outside() {
        let room = Room::new(vec![
            Coord::new(0.0, 0.0),
            Coord::new(100.0, 0.0),
            Coord::new(100.0, 50.0),
            Coord::new(50.0, 50.0),
            Coord::new(50.0, 100.0),
            Coord::new(0.0, 100.0),
        ])
        .unwrap();
        assert!(room.contains(Coord::new(25.0, 75.0)));
        assert!(room.contains(Coord::new(75.0, 25.0)));
        assert!(!room.contains(Coord::new(75.0, 75.0)));
    }

    #[test]
    fn crosses_detects_occlusion() {
        let inner = Room::new(vec![
            Coord::new(40.0, 40.0),
            Coord::new(60.0, 40.0),
            Coord::new(60.0, 60.0),
            Coord::new(40.0, 60.0),
        ])
        .unwrap();
        assert!(inner.crosses(Coord::new(10.0, 50.0), Coord::new(90.0, 50.0)));
        assert!(!inner.crosses(Coord::new(10.0, 10.0), Coord::new(90.0, 10.0)));
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        assert!(matches!(
            Room::new(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)]),
            Err(ConfigError::DegeneratePolygon(2))
        ));
    }

    #[test]
    fn interior_ray_origin_is_rejected() {
        let polygon = vec![
            Coord::new(0.0, 0.0),
            Coord::new(10.0, 0.0),
            Coord::new(10.0, 10.0),
            Coord::new(0.0, 10.0),
        ];
        assert!(matches!(
            Room::with_ray_origin(polygon.clone(), Coord::new(5.0, 5.0)),
            Err(ConfigError::InteriorRayOrigin { .. })
        ));
        assert!(Room::with_ray_origin(polygon, Coord::new(-5.0, -5.0)).is_ok());
    }

    #[test]
    fn wkt_lines_parse_with_junk_and_rounding() {
        assert_eq!(
            parse_wkt_coord("POINT (12.3456789 7.0001)"),
            Some(Coord::new(12.346, 7.0))
        );
        assert_eq!(parse_wkt_coord("  (3 4)  trailing"), Some(Coord::new(3.0, 4.0)));
        assert_eq!(parse_wkt_coord("no pair here"), None);
        assert_eq!(parse_wkt_coord("(not numeric)"), None);
    }
}
