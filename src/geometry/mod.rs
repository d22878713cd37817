//! Occluder geometry index and visibility polygon construction
//!
//! `Geometry` owns one `GeoRegion` per map region. Regions cache merged
//! square outlines and circle occluders per quadrant, so a light only
//! touches the quadrants under its bounding box and a map edit only
//! rebuilds the quadrants it overlaps.
//!
//! Callers own the ordering: after any block change, `refresh` the edited
//! area before building lights that can see it.

mod circle;
mod cluster;
mod edge;
mod occluder;
mod region;

pub use circle::Circle;
pub use cluster::BlockCluster;
pub use edge::{Axis, Edge, Face};
pub use occluder::{GatherBuffer, Occlude, Occluder, VertexSet};
pub use region::{extract_occluders, GeoRegion, Quadrant};

use serde::{Serialize, Deserialize};

use crate::config::ShadowConfig;
use crate::light::{simplify_fan, sort_fan, Light2D, Ray2D};
use crate::math::{wrap_angle, Vec2};
use crate::world::{Area, TileMap, REGION_SIZE};

/// Cached occluder counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryStats {
    pub regions: usize,
    pub quadrants: usize,
    pub clusters: usize,
    pub edges: usize,
    pub circles: usize,
}

pub struct Geometry {
    bounds: Area,
    regions_per_side: i32,
    /// Row-major by region y, then x
    regions: Vec<GeoRegion>,
    config: ShadowConfig,
}

impl Geometry {
    /// Build the full index for a map
    pub fn new(map: &TileMap, config: &ShadowConfig) -> Self {
        let per_side = map.regions_per_side();
        let mut regions = Vec::with_capacity((per_side * per_side) as usize);
        for ry in 0..per_side {
            for rx in 0..per_side {
                regions.push(GeoRegion::new(map, rx, ry));
            }
        }
        let geometry = Self {
            bounds: map.area(),
            regions_per_side: per_side,
            regions,
            config: *config,
        };
        let stats = geometry.stats();
        log::info!(
            "built geometry for {}x{} map: {} regions, {} clusters, {} edges, {} circles",
            map.size(), map.size(), stats.regions, stats.clusters, stats.edges, stats.circles
        );
        geometry
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Map bounds this index was built for
    pub fn bounds(&self) -> Area {
        self.bounds
    }

    pub fn regions(&self) -> &[GeoRegion] {
        &self.regions
    }

    /// Indices of the regions overlapping an area already clamped to the map
    fn region_indices(&self, area: &Area) -> impl Iterator<Item = usize> {
        let per_side = self.regions_per_side;
        let (rx0, ry0) = (area.min_x() / REGION_SIZE, area.min_y() / REGION_SIZE);
        let (rx1, ry1) = (area.max_x() / REGION_SIZE, area.max_y() / REGION_SIZE);
        (ry0..=ry1).flat_map(move |ry| (rx0..=rx1).map(move |rx| (rx + ry * per_side) as usize))
    }

    /// Collect every occluder within `light_area` as seen from `viewpoint`.
    /// The buffer is appended to, not cleared.
    pub fn gather(&self, viewpoint: Vec2, light_area: &Area, out: &mut GatherBuffer) {
        let Some(area) = self.bounds.intersection(light_area) else {
            return;
        };
        for idx in self.region_indices(&area) {
            self.regions[idx].gather(viewpoint, &area, self.config.circle_ray_density, out);
        }
    }

    /// Rebuild the quadrants overlapping `area` from the current map state.
    /// Returns the number of quadrants rebuilt.
    pub fn refresh(&mut self, area: &Area, map: &TileMap) -> usize {
        assert_eq!(map.area(), self.bounds, "geometry refreshed with a different map");
        let Some(area) = self.bounds.intersection(area) else {
            return 0;
        };
        let indices: Vec<usize> = self.region_indices(&area).collect();
        let rebuilt: usize = indices
            .into_iter()
            .map(|idx| self.regions[idx].refresh(&area, map))
            .sum();
        log::trace!("refresh {}: {} quadrants rebuilt", area, rebuilt);
        rebuilt
    }

    /// Rebuild one light's visibility polygon
    pub fn build_light(&self, light: &mut Light2D) {
        let mut buffer = GatherBuffer::default();
        self.build_light_with(light, &mut buffer);
    }

    /// Rebuild many lights, sharing one scratch buffer
    pub fn build_lights(&self, lights: &mut [Light2D]) {
        let mut buffer = GatherBuffer::default();
        for light in lights {
            self.build_light_with(light, &mut buffer);
        }
    }

    fn build_light_with(&self, light: &mut Light2D, buffer: &mut GatherBuffer) {
        buffer.clear();
        let origin = light.origin();
        let radius = light.radius();
        let reach = Area::new(
            (origin.x - radius).floor() as i32,
            (origin.y - radius).floor() as i32,
            (origin.x + radius).floor() as i32,
            (origin.y + radius).floor() as i32,
        );
        let Some(light_area) = self.bounds.intersection(&reach) else {
            light.set_rays(Vec::new());
            return;
        };

        // The light's own box, facing inwards, caps every ray
        for edge in Edge::rect(&light_area, true) {
            edge.collect(origin, buffer);
        }
        self.gather(origin, &light_area, buffer);

        let eps = self.config.probe_epsilon as f64;
        let mut rays = Vec::with_capacity(buffer.vertices.len() * 3);
        for vertex in buffer.vertices.iter() {
            // f64 differences are exact, so the center ray stays on the vertex
            let base = (vertex.y as f64 - origin.y as f64).atan2(vertex.x as f64 - origin.x as f64);
            for angle in [base - eps, base, base + eps] {
                let dir = Vec2::new(angle.cos() as f32, angle.sin() as f32);
                let nearest = buffer
                    .occluders
                    .iter()
                    .filter_map(|o| o.ray_intersect(origin, dir))
                    .min_by(|a, b| a.total_cmp(b));
                if let Some(t) = nearest {
                    rays.push(Ray2D::new(origin + dir * t, wrap_angle(angle as f32), t));
                }
            }
        }
        sort_fan(&mut rays);
        simplify_fan(&mut rays, self.config.collinear_tolerance);
        light.set_rays(rays);
    }

    pub fn stats(&self) -> GeometryStats {
        let mut stats = GeometryStats {
            regions: self.regions.len(),
            ..Default::default()
        };
        for quadrant in self.regions.iter().flat_map(|r| r.quadrants()) {
            stats.quadrants += 1;
            stats.clusters += quadrant.clusters().len();
            stats.edges += quadrant.clusters().iter().map(|c| c.edges().len()).sum::<usize>();
            stats.circles += quadrant.circles().len();
        }
        stats
    }
}
