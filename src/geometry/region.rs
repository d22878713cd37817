//! Map regions and their occluder quadrants
//!
//! A region is a `REGION_SIZE` square of tiles split into 4 quadrants
//! (NW, NE, SE, SW). Each quadrant caches the square clusters and circle
//! occluders found inside it and is always rebuilt as a whole, never tile
//! by tile, so edges stay merged.

use std::collections::VecDeque;

use crate::math::Vec2;
use crate::spatial::PointQuadTree;
use crate::world::{Area, BlockKind, CircleTier, TileMap, QUADRANT_SIZE, REGION_SIZE};
use super::cluster::BlockCluster;
use super::occluder::{GatherBuffer, Occlude};
use super::Circle;

/// Quadrant offsets in quadrant units: NW, NE, SE, SW
const QUADRANT_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 1), (1, 0), (0, 0)];

/// Cached occluders of one quadrant
#[derive(Debug, Clone)]
pub struct Quadrant {
    /// Quadrant bounds clipped to the map
    area: Area,
    clusters: Vec<BlockCluster>,
    circles: PointQuadTree<CircleTier>,
    builds: u32,
}

impl Quadrant {
    fn new(area: Area, map: &TileMap) -> Self {
        let (clusters, circles) = extract_occluders(&area, map);
        Self { area, clusters, circles, builds: 1 }
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn clusters(&self) -> &[BlockCluster] {
        &self.clusters
    }

    pub fn circles(&self) -> &PointQuadTree<CircleTier> {
        &self.circles
    }

    /// How many times this quadrant has been built
    pub fn builds(&self) -> u32 {
        self.builds
    }

    /// Re-extract everything from the current map state
    pub fn rebuild(&mut self, map: &TileMap) {
        let (clusters, circles) = extract_occluders(&self.area, map);
        self.clusters = clusters;
        self.circles = circles;
        self.builds += 1;
        log::trace!("rebuilt quadrant {}: {} clusters, {} circles",
            self.area, self.clusters.len(), self.circles.len());
    }

    fn gather(&self, viewpoint: Vec2, light_area: &Area, circle_density: u32, out: &mut GatherBuffer) {
        self.circles.query(light_area, |x, y, tier| {
            Circle::from_tile(x, y, tier, circle_density).collect(viewpoint, out);
        });
        for cluster in &self.clusters {
            if cluster.bounds().intersects(light_area) {
                for edge in cluster.edges() {
                    edge.collect(viewpoint, out);
                }
            }
        }
    }
}

/// Scan a quadrant: flood fill square tiles into clusters and index circles.
///
/// Only square tiles are marked visited by the flood fill, so circles next
/// to a cluster are still indexed.
pub fn extract_occluders(area: &Area, map: &TileMap) -> (Vec<BlockCluster>, PointQuadTree<CircleTier>) {
    let side = area.cols().max(area.rows());
    let mut circles = PointQuadTree::new(area.min_x(), area.min_y(), side);
    let mut clusters = Vec::new();
    let mut visited = vec![false; area.size()];
    let mut queue = VecDeque::new();
    let mut members = Vec::new();

    for (x, y) in area.tiles() {
        match map.block(x, y) {
            BlockKind::None => {}
            BlockKind::Circle(tier) => circles.insert(x, y, tier),
            BlockKind::Square => {
                if visited[area.local_index(x, y)] {
                    continue;
                }
                visited[area.local_index(x, y)] = true;
                let mut bounds = Area::point(x, y);
                members.clear();
                queue.push_back((x, y));
                while let Some((cx, cy)) = queue.pop_front() {
                    members.push((cx, cy));
                    bounds.expand_to_contain(cx, cy);
                    for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if !area.contains(nx, ny) || !map.is_square(nx, ny) {
                            continue;
                        }
                        let idx = area.local_index(nx, ny);
                        if !visited[idx] {
                            visited[idx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
                let mut layout = vec![false; bounds.size()];
                for &(mx, my) in &members {
                    layout[bounds.local_index(mx, my)] = true;
                }
                clusters.push(BlockCluster::new(bounds, &layout));
            }
        }
    }
    (clusters, circles)
}

/// One map region and its 4 quadrants. Quadrants entirely outside the map
/// (small maps) are absent.
#[derive(Debug, Clone)]
pub struct GeoRegion {
    bounds: Area,
    quadrants: [Option<Quadrant>; 4],
}

impl GeoRegion {
    /// Build the region at region coordinates (rx, ry)
    pub fn new(map: &TileMap, rx: i32, ry: i32) -> Self {
        let x0 = rx * REGION_SIZE;
        let y0 = ry * REGION_SIZE;
        let quadrants = QUADRANT_OFFSETS.map(|(qx, qy)| {
            let quad = Area::square(x0 + qx * QUADRANT_SIZE, y0 + qy * QUADRANT_SIZE, QUADRANT_SIZE);
            map.area().intersection(&quad).map(|area| Quadrant::new(area, map))
        });
        Self {
            bounds: Area::square(x0, y0, REGION_SIZE),
            quadrants,
        }
    }

    /// Unclipped region bounds
    pub fn bounds(&self) -> Area {
        self.bounds
    }

    /// Present quadrants in NW, NE, SE, SW order
    pub fn quadrants(&self) -> impl Iterator<Item = &Quadrant> {
        self.quadrants.iter().flatten()
    }

    /// Collect occluders from every quadrant touching `light_area`
    pub fn gather(&self, viewpoint: Vec2, light_area: &Area, circle_density: u32, out: &mut GatherBuffer) {
        for quadrant in self.quadrants() {
            if quadrant.area().intersects(light_area) {
                quadrant.gather(viewpoint, light_area, circle_density, out);
            }
        }
    }

    /// Rebuild the quadrants overlapping `area`. Returns how many were rebuilt.
    pub fn refresh(&mut self, area: &Area, map: &TileMap) -> usize {
        let mut rebuilt = 0;
        for quadrant in self.quadrants.iter_mut().flatten() {
            if quadrant.area().intersects(area) {
                quadrant.rebuild(map);
                rebuilt += 1;
            }
        }
        rebuilt
    }
}
