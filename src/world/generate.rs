//! Seeded random maps for benchmarks and demos

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Area, BlockKind, CircleTier, TerrainKind, TileMap};

/// Random map of wall runs, rubble and pillars.
///
/// `density` is the rough fraction of tiles covered by occluders. The same
/// seed always gives the same map.
pub fn generate_map(size: u32, seed: u64, density: f32) -> TileMap {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = TileMap::new(size);
    let side = size as i32;
    let target = (map.tile_count() as f32 * density.clamp(0.0, 1.0)) as usize;

    let mut placed = 0;
    while placed < target {
        let x = rng.gen_range(0..side);
        let y = rng.gen_range(0..side);
        let roll: f32 = rng.gen();
        let (kind, area) = if roll < 0.6 {
            // Wall run
            let len = rng.gen_range(2..=(side / 4).max(2));
            let area = if rng.gen_bool(0.5) {
                Area::new(x, y, x + len - 1, y)
            } else {
                Area::new(x, y, x, y + len - 1)
            };
            (BlockKind::Square, area)
        } else if roll < 0.85 {
            let w = rng.gen_range(1..=3);
            let h = rng.gen_range(1..=3);
            (BlockKind::Square, Area::new(x, y, x + w - 1, y + h - 1))
        } else {
            let tier = CircleTier::ALL[rng.gen_range(0..CircleTier::ALL.len())];
            (BlockKind::Circle(tier), Area::point(x, y))
        };
        let Some(area) = map.area().intersection(&area) else {
            continue;
        };
        map.set_block_area(kind, area);
        map.set_obstacle_area(area, true);
        placed += area.size();
    }

    // A few terrain patches
    for _ in 0..(side / 8).max(1) {
        let kind = TerrainKind::ALL[rng.gen_range(1..TerrainKind::ALL.len())];
        let x = rng.gen_range(0..side);
        let y = rng.gen_range(0..side);
        let r = rng.gen_range(1..=(side / 8).max(1));
        map.set_terrain_area(kind, Area::new(x - r, y - r, x + r, y + r));
    }

    log::info!("generated {}x{} map (seed {}, {} occluder tiles placed)", size, size, seed, placed);
    map
}
