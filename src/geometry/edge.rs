//! Directed boundary edges of square blocks
//!
//! An edge is an axis-aligned integer segment. Its direction encodes which
//! face it belongs to: block outlines are wound counter-clockwise, so the
//! solid side is always on the right of the direction of travel.
//!
//! ```text
//!          North: x -> x+1
//!        +---->----+
//!  West  ^         |  East
//!  y+1   |  block  v  y -> y+1 (drawn going down here, travels up)
//!  -> y  +----<----+
//!          South: x+1 -> x
//! ```

use serde::{Serialize, Deserialize};

use crate::math::Vec2;
use crate::world::Area;
use super::occluder::{GatherBuffer, Occlude, Occluder};

/// Slack on segment ends, in radians of ray direction. A ray aimed exactly
/// at a corner still registers, while side probes (`probe_epsilon`, 50x
/// larger at the least) slip past it.
const RAY_SLACK: f64 = 1e-6;

/// Which side of a block an edge bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    North,
    East,
    South,
    West,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::North, Face::East, Face::South, Face::West];

    /// Dense index for face-keyed side tables
    pub fn index(self) -> usize {
        match self {
            Face::North => 0,
            Face::East => 1,
            Face::South => 2,
            Face::West => 3,
        }
    }

    /// Offset to the neighbor across this face
    pub fn offset(self) -> (i32, i32) {
        match self {
            Face::North => (0, 1),
            Face::East => (1, 0),
            Face::South => (0, -1),
            Face::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Runs along x at a fixed y
    Horizontal,
    /// Runs along y at a fixed x
    Vertical,
}

/// Directed axis-aligned segment from `p0` to `p1` on the line `line`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    axis: Axis,
    line: i32,
    p0: i32,
    p1: i32,
}

impl Edge {
    /// Horizontal edge at `y` from `x0` to `x1`
    pub fn horizontal(y: i32, x0: i32, x1: i32) -> Self {
        Self { axis: Axis::Horizontal, line: y, p0: x0, p1: x1 }
    }

    /// Vertical edge at `x` from `y0` to `y1`
    pub fn vertical(x: i32, y0: i32, y1: i32) -> Self {
        Self { axis: Axis::Vertical, line: x, p0: y0, p1: y1 }
    }

    /// Unit edge on one face of the tile at (x, y)
    pub fn tile_face(face: Face, x: i32, y: i32) -> Self {
        match face {
            Face::North => Edge::horizontal(y + 1, x, x + 1),
            Face::South => Edge::horizontal(y, x + 1, x),
            Face::East => Edge::vertical(x + 1, y, y + 1),
            Face::West => Edge::vertical(x, y + 1, y),
        }
    }

    /// The 4 outer edges of an area: North, South, East, West.
    ///
    /// With `inward` set the winding is reversed, so the edges face the
    /// inside of the rectangle (used to cap a light at its bounds).
    pub fn rect(area: &Area, inward: bool) -> [Edge; 4] {
        let x0 = area.min_x();
        let y0 = area.min_y();
        let x1 = area.max_x() + 1;
        let y1 = area.max_y() + 1;
        let edges = [
            Edge::horizontal(y1, x0, x1),
            Edge::horizontal(y0, x1, x0),
            Edge::vertical(x1, y0, y1),
            Edge::vertical(x0, y1, y0),
        ];
        if inward {
            edges.map(Edge::reversed)
        } else {
            edges
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Fixed coordinate (y for horizontal edges, x for vertical ones)
    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn p0(&self) -> i32 {
        self.p0
    }

    pub fn p1(&self) -> i32 {
        self.p1
    }

    pub fn face(&self) -> Face {
        let forward = self.p1 > self.p0;
        match (self.axis, forward) {
            (Axis::Horizontal, true) => Face::North,
            (Axis::Horizontal, false) => Face::South,
            (Axis::Vertical, true) => Face::East,
            (Axis::Vertical, false) => Face::West,
        }
    }

    /// Length in tiles
    pub fn len(&self) -> i32 {
        (self.p1 - self.p0).abs()
    }

    pub fn v0(&self) -> Vec2 {
        self.point(self.p0)
    }

    pub fn v1(&self) -> Vec2 {
        self.point(self.p1)
    }

    fn point(&self, p: i32) -> Vec2 {
        match self.axis {
            Axis::Horizontal => Vec2::new(p as f32, self.line as f32),
            Axis::Vertical => Vec2::new(self.line as f32, p as f32),
        }
    }

    /// Same segment, opposite direction (and so the opposite face)
    pub fn reversed(self) -> Self {
        Self { p0: self.p1, p1: self.p0, ..self }
    }

    /// Extend the endpoint on the positive side of the axis by one tile.
    ///
    /// Blocks are scanned row-major, so a colinear neighbor edge always
    /// continues towards +x or +y.
    pub fn grow(&mut self) {
        if self.p1 > self.p0 {
            self.p1 += 1;
        } else {
            self.p0 += 1;
        }
    }

    /// Is the solid side of this edge turned away from the viewpoint?
    pub fn faces(&self, viewpoint: Vec2) -> bool {
        let line = self.line as f32;
        match self.face() {
            Face::North => viewpoint.y > line,
            Face::South => viewpoint.y < line,
            Face::East => viewpoint.x > line,
            Face::West => viewpoint.x < line,
        }
    }
}

impl Occlude for Edge {
    fn collect(&self, viewpoint: Vec2, out: &mut GatherBuffer) {
        if self.faces(viewpoint) {
            out.vertices.insert(self.v0());
            out.vertices.insert(self.v1());
            out.occluders.push(Occluder::Edge(*self));
        }
    }

    fn ray_intersect(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        let line = self.line as f64;
        let (along_origin, along_dir, across_origin, across_dir) = match self.axis {
            Axis::Horizontal => (origin.x as f64, dir.x as f64, origin.y as f64, dir.y as f64),
            Axis::Vertical => (origin.y as f64, dir.y as f64, origin.x as f64, dir.x as f64),
        };
        if across_dir == 0.0 {
            return None;
        }
        let t = (line - across_origin) / across_dir;
        if t < 0.0 {
            return None;
        }
        let hit = along_origin + t * along_dir;
        // Angular slack turned into distance along the segment
        let slack = RAY_SLACK * t / across_dir.abs();
        let lo = self.p0.min(self.p1) as f64 - slack;
        let hi = self.p0.max(self.p1) as f64 + slack;
        (hit >= lo && hit <= hi).then_some(t as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_faces_wind_ccw() {
        assert_eq!(Edge::tile_face(Face::North, 2, 3).face(), Face::North);
        assert_eq!(Edge::tile_face(Face::South, 2, 3).face(), Face::South);
        assert_eq!(Edge::tile_face(Face::East, 2, 3).face(), Face::East);
        assert_eq!(Edge::tile_face(Face::West, 2, 3).face(), Face::West);

        let north = Edge::tile_face(Face::North, 2, 3);
        assert_eq!(north.v0(), Vec2::new(2.0, 4.0));
        assert_eq!(north.v1(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_grow_extends_positive_end() {
        let mut south = Edge::tile_face(Face::South, 0, 0);
        south.grow();
        assert_eq!((south.p0(), south.p1()), (2, 0));
        assert_eq!(south.face(), Face::South);

        let mut east = Edge::tile_face(Face::East, 0, 0);
        east.grow();
        assert_eq!((east.p0(), east.p1()), (0, 2));
        assert_eq!(east.len(), 2);
    }

    #[test]
    fn test_rect_inward_reverses_faces() {
        let area = Area::new(0, 0, 3, 1);
        let outer = Edge::rect(&area, false);
        assert_eq!(outer.map(|e| e.face()), [Face::North, Face::South, Face::East, Face::West]);
        assert_eq!(outer[0].line(), 2);
        assert_eq!(outer[2].line(), 4);

        let inner = Edge::rect(&area, true);
        assert_eq!(inner.map(|e| e.face()), [Face::South, Face::North, Face::West, Face::East]);
        // Inward edges are visible from inside the rectangle
        let center = Vec2::new(2.0, 1.0);
        assert!(inner.iter().all(|e| e.faces(center)));
        assert!(outer.iter().all(|e| !e.faces(center)));
    }

    #[test]
    fn test_collect_skips_back_faces() {
        let north = Edge::tile_face(Face::North, 0, 0);
        let mut buffer = GatherBuffer::default();
        north.collect(Vec2::new(0.5, -3.0), &mut buffer);
        assert!(buffer.occluders.is_empty());
        north.collect(Vec2::new(0.5, 3.0), &mut buffer);
        assert_eq!(buffer.occluders.len(), 1);
        assert_eq!(buffer.vertices.len(), 2);
    }

    #[test]
    fn test_ray_intersect() {
        let wall = Edge::vertical(5, 0, 4);
        let t = wall.ray_intersect(Vec2::new(1.0, 2.0), Vec2::new(1.0, 0.0));
        assert_eq!(t, Some(4.0));
        // Parallel and behind
        assert_eq!(wall.ray_intersect(Vec2::new(1.0, 2.0), Vec2::new(0.0, 1.0)), None);
        assert_eq!(wall.ray_intersect(Vec2::new(1.0, 2.0), Vec2::new(-1.0, 0.0)), None);
        // Passes above the segment
        assert_eq!(wall.ray_intersect(Vec2::new(1.0, 6.0), Vec2::new(1.0, 0.0)), None);
    }

    #[test]
    fn test_side_ray_slips_past_near_corner() {
        // Corner (9, 8) is 0.42 from the origin, so a 1e-4 rad side ray
        // passes it by about 4e-5 tiles
        let east = Edge::tile_face(Face::East, 8, 8);
        let origin = Vec2::new(9.36, 8.22);
        let base = (8.0 - origin.y as f64).atan2(9.0 - origin.x as f64);
        let dir = |a: f64| Vec2::new(a.cos() as f32, a.sin() as f32);

        assert!(east.ray_intersect(origin, dir(base)).is_some());
        // Counter-clockwise moves the ray below the corner, off the face
        assert_eq!(east.ray_intersect(origin, dir(base + 1e-4)), None);
        assert!(east.ray_intersect(origin, dir(base - 1e-4)).is_some());
    }
}
