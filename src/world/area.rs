//! Integer tile rectangles
//!
//! An `Area` is an axis-aligned block of tiles with inclusive min/max corners.
//! Every edit and query in the crate is scoped by one, and clamping against
//! the map bounds is always done with `intersection`.

use serde::{Serialize, Deserialize};

/// Axis-aligned tile rectangle, min and max inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl Area {
    /// Create from two corners in any order
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Single tile area
    pub fn point(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    /// Square area of `size` tiles starting at (x, y)
    pub fn square(x: i32, y: i32, size: i32) -> Self {
        debug_assert!(size > 0, "square area needs a positive size");
        Self::new(x, y, x + size - 1, y + size - 1)
    }

    pub fn min_x(&self) -> i32 {
        self.min_x
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Width in tiles
    pub fn cols(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    /// Height in tiles
    pub fn rows(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    /// Number of tiles covered
    pub fn size(&self) -> usize {
        self.cols() as usize * self.rows() as usize
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn contains_area(&self, other: &Area) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn intersects(&self, other: &Area) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Overlap of the two areas, `None` when they are disjoint
    pub fn intersection(&self, other: &Area) -> Option<Area> {
        if !self.intersects(other) {
            return None;
        }
        Some(Area {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Grow by `amount` tiles on every side
    pub fn expand(&self, amount: i32) -> Area {
        Area::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    /// Grow just enough to contain (x, y)
    pub fn expand_to_contain(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Row-major index of (x, y) relative to this area's min corner
    pub fn local_index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.contains(x, y));
        (x - self.min_x) as usize + (y - self.min_y) as usize * self.cols() as usize
    }

    /// All tiles in row-major order (south row first, west to east)
    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32)> {
        let (x0, x1) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y).flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }
}

impl std::fmt::Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{} .. {},{}]", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let a = Area::new(5, 7, 1, 2);
        assert_eq!((a.min_x(), a.min_y(), a.max_x(), a.max_y()), (1, 2, 5, 7));
        assert_eq!(a.cols(), 5);
        assert_eq!(a.rows(), 6);
        assert_eq!(a.size(), 30);
    }

    #[test]
    fn test_intersection_clamps() {
        let map = Area::new(0, 0, 15, 15);
        let edit = Area::new(-3, 10, 4, 20);
        assert_eq!(map.intersection(&edit), Some(Area::new(0, 10, 4, 15)));
        assert_eq!(map.intersection(&Area::new(16, 0, 20, 3)), None);
    }

    #[test]
    fn test_expand_and_contains() {
        let a = Area::point(3, 3).expand(1);
        assert_eq!(a, Area::new(2, 2, 4, 4));
        assert!(a.contains(2, 4));
        assert!(!a.contains(5, 4));
        assert!(a.contains_area(&Area::point(3, 3)));
    }

    #[test]
    fn test_tiles_row_major() {
        let tiles: Vec<_> = Area::new(0, 0, 1, 1).tiles().collect();
        assert_eq!(tiles, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        let a = Area::new(2, 3, 4, 5);
        assert_eq!(a.local_index(3, 4), 4);
    }
}
