//! Round occluders
//!
//! A circle does not contribute boundary segments. Instead it projects a
//! line of guide vertices across itself, perpendicular to the light
//! direction, and answers ray hits with an exact ray/circle test. The two
//! outermost guides sit just outside the tangent points, so side rays
//! find both the circle's edge and whatever lies beyond it.

use serde::{Serialize, Deserialize};

use crate::math::Vec2;
use crate::world::CircleTier;
use super::occluder::{GatherBuffer, Occlude, Occluder};

/// Angle the outer guides are turned past the exact tangents (radians).
/// Kept well below the smallest allowed `probe_epsilon`.
const TANGENT_SLACK: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    center: Vec2,
    radius: f32,
    /// Guide vertices on each side of the center
    steps: u32,
}

impl Circle {
    /// `density` is guide vertices per unit of radius (at least one per side)
    pub fn new(center: Vec2, radius: f32, density: u32) -> Self {
        let steps = (density as f32 * radius.round()).max(1.0) as u32;
        Self { center, radius, steps }
    }

    /// Circle of the given tier centered in the tile at (x, y)
    pub fn from_tile(x: i32, y: i32, tier: CircleTier, density: u32) -> Self {
        Self::new(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), tier.radius(), density)
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Guide vertices as seen from `viewpoint`, `2 * steps + 1` of them.
    ///
    /// Inner guides are spread across the center. The outer two lie on the
    /// tangent lines, turned outwards by `TANGENT_SLACK` so a ray aimed at them
    /// misses the circle. From inside the circle only the inner line is used.
    pub fn silhouette(&self, viewpoint: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let side = (self.center - viewpoint).perp().normalize();
        let spacing = self.radius / self.steps as f32;
        let steps = self.steps as i32;
        let tangents = self.tangent_points(viewpoint);
        (-steps..=steps).map(move |i| match tangents {
            Some((right, _)) if i == -steps => right,
            Some((_, left)) if i == steps => left,
            _ => self.center + side * (spacing * i as f32),
        })
    }

    /// Points just outside the two tangents from `viewpoint`, clockwise one
    /// first. `None` when the viewpoint is inside the circle.
    fn tangent_points(&self, viewpoint: Vec2) -> Option<(Vec2, Vec2)> {
        let dx = self.center.x as f64 - viewpoint.x as f64;
        let dy = self.center.y as f64 - viewpoint.y as f64;
        let r = self.radius as f64;
        let d2 = dx * dx + dy * dy;
        if d2 <= r * r {
            return None;
        }
        let base = dy.atan2(dx);
        let half = (r / d2.sqrt()).asin() + TANGENT_SLACK;
        let reach = (d2 - r * r).sqrt();
        let point = |angle: f64| {
            Vec2::new(
                (viewpoint.x as f64 + angle.cos() * reach) as f32,
                (viewpoint.y as f64 + angle.sin() * reach) as f32,
            )
        };
        Some((point(base - half), point(base + half)))
    }
}

impl Occlude for Circle {
    fn collect(&self, viewpoint: Vec2, out: &mut GatherBuffer) {
        for v in self.silhouette(viewpoint) {
            out.vertices.insert(v);
        }
        out.occluders.push(Occluder::Circle(*self));
    }

    /// Expects a unit length `dir`. A ray starting inside the circle hits at t = 0.
    fn ray_intersect(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        let (dx, dy) = (dir.x as f64, dir.y as f64);
        let cx = self.center.x as f64 - origin.x as f64;
        let cy = self.center.y as f64 - origin.y as f64;
        let r2 = self.radius as f64 * self.radius as f64;
        let tca = cx * dx + cy * dy;
        // Squared distance from the center to the ray's line
        let cross = cx * dy - cy * dx;
        let d2 = cross * cross;
        if d2 > r2 {
            return None;
        }
        let thc = (r2 - d2).sqrt();
        let t0 = tca - thc;
        let t1 = tca + thc;
        (t1 >= 0.0).then_some(t0.max(0.0) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silhouette_spans_the_tangents() {
        let circle = Circle::from_tile(4, 0, CircleTier::Large, 1);
        let viewpoint = Vec2::new(0.5, 0.5);
        let points: Vec<_> = circle.silhouette(viewpoint).collect();
        assert_eq!(points.len(), 3);
        // Middle guide is the center, outer ones sit on the tangents
        assert_eq!(points[1], circle.center());
        assert!(points[0].y < 0.5 && points[2].y > 0.5);
        for p in [points[0], points[2]] {
            let tangent_len = (4.0f32 * 4.0 - 0.25).sqrt();
            assert!((p.distance(viewpoint) - tangent_len).abs() < 1e-4);
            assert!(p.distance(circle.center()) >= 0.5);
        }
    }

    #[test]
    fn test_tangent_guides_graze_the_circle() {
        let circle = Circle::from_tile(14, 14, CircleTier::Large, 1);
        let origin = Vec2::new(16.0, 16.0);
        for guide in [circle.silhouette(origin).next(), circle.silhouette(origin).last()] {
            let to = guide.unwrap() - origin;
            let base = (to.y as f64).atan2(to.x as f64);
            let dir = |a: f64| Vec2::new(a.cos() as f32, a.sin() as f32);
            // Aimed at the guide the ray passes, one side ray hits, the other passes
            assert_eq!(circle.ray_intersect(origin, dir(base)), None);
            let hits = [base - 1e-4, base + 1e-4]
                .iter()
                .filter(|&&a| circle.ray_intersect(origin, dir(a)).is_some())
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_silhouette_from_inside_stays_on_center_line() {
        let circle = Circle::new(Vec2::new(5.0, 5.0), 1.0, 1);
        let points: Vec<_> = circle.silhouette(Vec2::new(5.2, 5.0)).collect();
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| (p.x - 5.0).abs() < 1e-6));
    }

    #[test]
    fn test_density_scales_with_radius() {
        let big = Circle::new(Vec2::ZERO, 3.0, 2);
        assert_eq!(big.silhouette(Vec2::new(-5.0, 0.0)).count(), 13);
        // Small tiers still get one vertex per side
        let small = Circle::from_tile(0, 0, CircleTier::Small, 1);
        assert_eq!(small.silhouette(Vec2::new(-5.0, 0.0)).count(), 3);
    }

    #[test]
    fn test_ray_intersect() {
        let circle = Circle::new(Vec2::new(5.0, 0.0), 1.0, 1);
        let t = circle.ray_intersect(Vec2::ZERO, Vec2::new(1.0, 0.0)).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert_eq!(circle.ray_intersect(Vec2::ZERO, Vec2::new(-1.0, 0.0)), None);
        assert_eq!(circle.ray_intersect(Vec2::ZERO, Vec2::new(0.0, 1.0)), None);
        // From inside
        assert_eq!(circle.ray_intersect(Vec2::new(5.0, 0.0), Vec2::new(0.0, 1.0)), Some(0.0));
    }
}
