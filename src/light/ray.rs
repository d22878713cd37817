//! Hit points of a light sweep and their fan ordering

use std::cmp::Ordering;

use serde::{Serialize, Deserialize};

use crate::math::Vec2;

/// Where one cast ray stopped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray2D {
    pub point: Vec2,
    /// Ray angle in [-PI, PI)
    pub angle: f32,
    /// Distance from the light origin
    pub distance: f32,
}

impl Ray2D {
    pub fn new(point: Vec2, angle: f32, distance: f32) -> Self {
        Self { point, angle, distance }
    }

    /// Fan order: angle descending, then nearer first, then by position
    pub fn fan_cmp(&self, other: &Ray2D) -> Ordering {
        other.angle.total_cmp(&self.angle)
            .then(self.distance.total_cmp(&other.distance))
            .then(self.point.x.total_cmp(&other.point.x))
            .then(self.point.y.total_cmp(&other.point.y))
    }
}

/// Sort hit points into triangle fan order around the origin
pub fn sort_fan(rays: &mut [Ray2D]) {
    rays.sort_unstable_by(|a, b| a.fan_cmp(b));
}

/// Is `b` on the straight segment from `a` to `c` (or a duplicate of either)?
///
/// `tolerance` is the sine of the largest bend still treated as straight.
fn is_redundant(a: Vec2, b: Vec2, c: Vec2, tolerance: f32) -> bool {
    let ab = a - b;
    let cb = c - b;
    let bend = ab.cross(cb).abs();
    bend <= tolerance * ab.len() * cb.len() && ab.dot(cb) <= 0.0
}

/// Drop fan points that lie on a straight run between their neighbors, or
/// repeat a neighbor. The fan is treated as closed (last wraps to first) and
/// never reduced below 3 points.
pub fn simplify_fan(rays: &mut Vec<Ray2D>, tolerance: f32) {
    if rays.len() <= 3 {
        return;
    }
    let total = rays.len();
    let mut kept: Vec<Ray2D> = Vec::with_capacity(total);
    for (i, ray) in rays.iter().enumerate() {
        let remaining = total - i;
        while kept.len() >= 2 && kept.len() + remaining > 3 {
            let a = kept[kept.len() - 2].point;
            let b = kept[kept.len() - 1].point;
            if is_redundant(a, b, ray.point, tolerance) {
                kept.pop();
            } else {
                break;
            }
        }
        kept.push(*ray);
    }

    // Close the loop across the seam
    loop {
        let n = kept.len();
        if n <= 3 {
            break;
        }
        if is_redundant(kept[n - 2].point, kept[n - 1].point, kept[0].point, tolerance) {
            kept.pop();
        } else if is_redundant(kept[n - 1].point, kept[0].point, kept[1].point, tolerance) {
            kept.remove(0);
        } else {
            break;
        }
    }
    *rays = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(x: f32, y: f32, angle: f32, distance: f32) -> Ray2D {
        Ray2D::new(Vec2::new(x, y), angle, distance)
    }

    #[test]
    fn test_sort_angle_descending_nearer_first() {
        let mut rays = vec![
            ray(1.0, 0.0, 0.0, 1.0),
            ray(0.0, 1.0, 1.5, 1.0),
            ray(3.0, 0.0, 0.0, 3.0),
            ray(0.0, -1.0, -1.5, 1.0),
        ];
        sort_fan(&mut rays);
        let order: Vec<(f32, f32)> = rays.iter().map(|r| (r.angle, r.distance)).collect();
        assert_eq!(order, vec![(1.5, 1.0), (0.0, 1.0), (0.0, 3.0), (-1.5, 1.0)]);
    }

    #[test]
    fn test_simplify_drops_straight_runs() {
        // Square traced clockwise with extra points on every side
        let points = [
            (0.0, 2.0), (1.0, 2.0), (2.0, 2.0),
            (2.0, 1.0), (2.0, 0.0),
            (1.0, 0.0), (0.0, 0.0),
            (0.0, 1.0),
        ];
        let mut rays: Vec<Ray2D> = points.iter().map(|&(x, y)| ray(x, y, 0.0, 0.0)).collect();
        simplify_fan(&mut rays, 0.0);
        let corners: Vec<(f32, f32)> = rays.iter().map(|r| (r.point.x, r.point.y)).collect();
        assert_eq!(corners, vec![(0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]);
    }

    #[test]
    fn test_simplify_removes_duplicates_and_keeps_three() {
        let mut rays = vec![ray(0.0, 0.0, 0.0, 0.0); 6];
        simplify_fan(&mut rays, 0.01);
        assert_eq!(rays.len(), 3);

        let mut triangle = vec![
            ray(0.0, 0.0, 0.0, 0.0),
            ray(1.0, 0.0, 0.0, 0.0),
            ray(1.0, 0.0, 0.0, 0.0),
            ray(0.0, 1.0, 0.0, 0.0),
        ];
        simplify_fan(&mut triangle, 0.0);
        assert_eq!(triangle.len(), 3);
    }

    #[test]
    fn test_simplify_keeps_corners_within_tolerance() {
        // A slight bend survives exact mode but not a loose tolerance
        let points = [(0.0, 0.0), (5.0, 0.01), (10.0, 0.0), (5.0, -5.0)];
        let mut exact: Vec<Ray2D> = points.iter().map(|&(x, y)| ray(x, y, 0.0, 0.0)).collect();
        let mut loose = exact.clone();
        simplify_fan(&mut exact, 0.0);
        simplify_fan(&mut loose, 0.01);
        assert_eq!(exact.len(), 4);
        assert_eq!(loose.len(), 3);
    }
}
