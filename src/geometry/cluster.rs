//! Square block clusters and their merged outlines
//!
//! A cluster is one 4-connected group of `Square` tiles inside a quadrant.
//! Its boundary is traced in a single row-major pass: when a member tile
//! exposes a face, the already visited neighbor that would share the same
//! line (south for east/west faces, west for north/south faces) is checked
//! first, and if it exposes the same face its edge is grown instead of
//! starting a new one.

use crate::world::Area;
use super::edge::{Edge, Face};

/// Merged outline of a group of connected square tiles
#[derive(Debug, Clone, PartialEq)]
pub struct BlockCluster {
    bounds: Area,
    tiles: usize,
    edges: Vec<Edge>,
}

impl BlockCluster {
    /// Build from a membership mask over `bounds` (row-major, south row first).
    pub fn new(bounds: Area, layout: &[bool]) -> Self {
        assert_eq!(layout.len(), bounds.size(), "cluster layout does not match bounds {}", bounds);
        let tiles = layout.iter().filter(|&&m| m).count();
        let edges = if tiles == bounds.size() {
            Edge::rect(&bounds, false).to_vec()
        } else {
            trace_outline(&bounds, layout)
        };
        Self { bounds, tiles, edges }
    }

    pub fn bounds(&self) -> Area {
        self.bounds
    }

    /// Number of member tiles
    pub fn tile_count(&self) -> usize {
        self.tiles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True when the cluster fills its bounding rectangle
    pub fn is_solid(&self) -> bool {
        self.tiles == self.bounds.size()
    }
}

/// Row-major boundary scan. `face_ids[tile][face]` records which edge each
/// member tile contributed to, so its neighbors can extend it.
fn trace_outline(bounds: &Area, layout: &[bool]) -> Vec<Edge> {
    let cols = bounds.cols();
    let rows = bounds.rows();
    let member = |cx: i32, cy: i32| {
        cx >= 0 && cy >= 0 && cx < cols && cy < rows && layout[(cx + cy * cols) as usize]
    };

    let mut edges: Vec<Edge> = Vec::new();
    let mut face_ids: Vec<[Option<usize>; 4]> = vec![[None; 4]; layout.len()];

    for cy in 0..rows {
        for cx in 0..cols {
            if !member(cx, cy) {
                continue;
            }
            let idx = (cx + cy * cols) as usize;
            let (x, y) = (bounds.min_x() + cx, bounds.min_y() + cy);
            for face in Face::ALL {
                let (dx, dy) = face.offset();
                if member(cx + dx, cy + dy) {
                    continue;
                }
                // Neighbor that may already carry a colinear edge on this face
                let (px, py) = match face {
                    Face::East | Face::West => (cx, cy - 1),
                    Face::North | Face::South => (cx - 1, cy),
                };
                let extend = if member(px, py) {
                    face_ids[(px + py * cols) as usize][face.index()]
                } else {
                    None
                };
                let id = match extend {
                    Some(id) => {
                        edges[id].grow();
                        id
                    }
                    None => {
                        edges.push(Edge::tile_face(face, x, y));
                        edges.len() - 1
                    }
                };
                face_ids[idx][face.index()] = Some(id);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::edge::Axis;

    fn cluster(bounds: Area, rows: &[&str]) -> BlockCluster {
        // rows northmost first, like map layouts
        let mut layout = vec![false; bounds.size()];
        for (i, row) in rows.iter().enumerate() {
            let cy = rows.len() - 1 - i;
            for (cx, c) in row.chars().enumerate() {
                layout[cx + cy * bounds.cols() as usize] = c == '#';
            }
        }
        BlockCluster::new(bounds, &layout)
    }

    fn faces(c: &BlockCluster, face: Face) -> Vec<Edge> {
        c.edges().iter().copied().filter(|e| e.face() == face).collect()
    }

    #[test]
    fn test_two_adjacent_tiles_merge() {
        let c = cluster(Area::new(3, 5, 4, 5), &["##"]);
        // Solid bounding box: 4 edges
        assert_eq!(c.edges().len(), 4);
        let north = faces(&c, Face::North);
        assert_eq!(north, vec![Edge::horizontal(6, 3, 5)]);
        let south = faces(&c, Face::South);
        assert_eq!(south, vec![Edge::horizontal(5, 5, 3)]);

        // The scan itself merges too, without the solid shortcut
        let mut traced = trace_outline(&c.bounds(), &[true, true]);
        traced.sort_by_key(|e| e.face().index());
        assert_eq!(traced, vec![
            Edge::horizontal(6, 3, 5),
            Edge::vertical(5, 5, 6),
            Edge::horizontal(5, 5, 3),
            Edge::vertical(3, 6, 5),
        ]);
    }

    #[test]
    fn test_l_shape_outline_is_merged() {
        let c = cluster(Area::new(0, 0, 2, 2), &[
            "#..",
            "#..",
            "###",
        ]);
        assert!(!c.is_solid());
        assert_eq!(c.tile_count(), 5);
        // An L has 6 sides
        assert_eq!(c.edges().len(), 6);
        assert_eq!(faces(&c, Face::West), vec![Edge::vertical(0, 3, 0)]);
        assert_eq!(faces(&c, Face::South), vec![Edge::horizontal(0, 3, 0)]);
        let mut north = faces(&c, Face::North);
        north.sort_by_key(|e| e.line());
        assert_eq!(north, vec![Edge::horizontal(1, 1, 3), Edge::horizontal(3, 0, 1)]);
        let mut east = faces(&c, Face::East);
        east.sort_by_key(|e| e.line());
        assert_eq!(east, vec![Edge::vertical(1, 1, 3), Edge::vertical(3, 0, 1)]);
    }

    #[test]
    fn test_outline_total_length_matches_perimeter() {
        let c = cluster(Area::new(0, 0, 3, 3), &[
            "####",
            "#..#",
            "#..#",
            "####",
        ]);
        // Ring: outer perimeter 16 plus inner hole perimeter 8
        let total: i32 = c.edges().iter().map(|e| e.len()).sum();
        assert_eq!(total, 24);
        assert_eq!(c.edges().len(), 8);
        let horizontal = c.edges().iter().filter(|e| e.axis() == Axis::Horizontal).count();
        assert_eq!(horizontal, 4);
    }

    #[test]
    fn test_full_bounds_shortcut() {
        let area = Area::square(16, 16, 16);
        let c = BlockCluster::new(area, &vec![true; area.size()]);
        assert!(c.is_solid());
        assert_eq!(c.tile_count(), 256);
        assert_eq!(c.edges(), &Edge::rect(&area, false)[..]);
    }
}
