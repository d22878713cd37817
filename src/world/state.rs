//! Edit facade over the map, its occluder geometry and its rooms
//!
//! `Geometry` and `Rooms` never look at each other. Both are derived from
//! the map, so every edit goes through `World`, which updates the map first
//! and then refreshes the affected quadrants and relabels rooms.

use crate::config::Config;
use crate::geometry::Geometry;
use crate::light::Light2D;
use crate::math::Vec2;
use crate::rooms::Rooms;
use super::{Area, BlockKind, TerrainKind, TileMap};

pub struct World {
    map: TileMap,
    geometry: Geometry,
    rooms: Rooms,
    config: Config,
}

impl World {
    pub fn new(map: TileMap, config: &Config) -> Self {
        let geometry = Geometry::new(&map, &config.shadow);
        let rooms = Rooms::with_config(&map, &config.rooms);
        Self { map, geometry, rooms, config: *config }
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give up the map, dropping derived state
    pub fn into_map(self) -> TileMap {
        self.map
    }

    /// Place occluder blocks. Occluders are obstacles; `BlockKind::None`
    /// clears the area instead.
    pub fn set_block(&mut self, kind: BlockKind, area: Area) {
        if !kind.is_occluder() {
            self.clear(area);
            return;
        }
        let Some(area) = self.map.area().intersection(&area) else {
            return;
        };
        self.map.set_block_area(kind, area);
        self.map.set_obstacle_area(area, true);
        self.geometry.refresh(&area, &self.map);
        self.rooms.place(area);
    }

    /// Block movement without occluding light
    pub fn place_obstacle(&mut self, area: Area) {
        let Some(area) = self.map.area().intersection(&area) else {
            return;
        };
        let had_occluders = area.tiles().any(|(x, y)| self.map.block(x, y).is_occluder());
        self.map.set_block_area(BlockKind::None, area);
        self.map.set_obstacle_area(area, true);
        if had_occluders {
            self.geometry.refresh(&area, &self.map);
        }
        self.rooms.place(area);
    }

    /// Remove blocks and obstacles, making the area walkable
    pub fn clear(&mut self, area: Area) {
        let Some(area) = self.map.area().intersection(&area) else {
            return;
        };
        let had_occluders = area.tiles().any(|(x, y)| self.map.block(x, y).is_occluder());
        self.map.set_block_area(BlockKind::None, area);
        self.map.set_obstacle_area(area, false);
        if had_occluders {
            self.geometry.refresh(&area, &self.map);
        }
        self.rooms.remove(area);
    }

    /// Terrain only changes movement cost, so nothing derived is touched
    pub fn set_terrain(&mut self, kind: TerrainKind, area: Area) {
        self.map.set_terrain_area(kind, area);
    }

    /// New light with its visibility polygon already built
    pub fn light(&self, origin: Vec2, radius: f32) -> Light2D {
        let mut light = Light2D::new(origin, radius);
        light.update_geometry(&self.geometry);
        light
    }

    /// Rebuild a batch of lights
    pub fn update_lights(&self, lights: &mut [Light2D]) {
        self.geometry.build_lights(lights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CircleTier;

    fn world(size: u32) -> World {
        World::new(TileMap::new(size), &Config::default())
    }

    #[test]
    fn test_blocks_update_rooms_and_geometry() {
        let mut world = world(16);
        world.set_block(BlockKind::Square, Area::new(0, 8, 15, 8));
        assert_eq!(world.rooms().room_count(), 2);
        assert_eq!(world.geometry().stats().clusters, 1);
        assert!(world.map().is_obstacle(3, 8));

        world.clear(Area::point(3, 8));
        assert_eq!(world.rooms().room_count(), 1);
        assert_eq!(world.geometry().stats().clusters, 2);
        assert!(!world.map().is_obstacle(3, 8));
        world.rooms().validate().unwrap();
    }

    #[test]
    fn test_plain_obstacles_do_not_occlude() {
        let mut world = world(16);
        world.place_obstacle(Area::new(0, 8, 15, 8));
        assert_eq!(world.rooms().room_count(), 2);
        assert_eq!(world.geometry().stats().clusters, 0);
        let light = world.light(Vec2::new(8.5, 6.5), 4.0);
        assert_eq!(light.rays().len(), 4);
    }

    #[test]
    fn test_obstacle_over_block_removes_occluder() {
        let mut world = world(16);
        world.set_block(BlockKind::Circle(CircleTier::Large), Area::point(5, 5));
        assert_eq!(world.geometry().stats().circles, 1);
        world.place_obstacle(Area::point(5, 5));
        assert_eq!(world.geometry().stats().circles, 0);
        assert!(world.rooms().is_obstacle(5, 5));
    }

    #[test]
    fn test_set_block_none_clears() {
        let mut world = world(8);
        world.set_block(BlockKind::Square, Area::new(2, 2, 3, 3));
        world.set_block(BlockKind::None, Area::new(2, 2, 3, 3));
        assert_eq!(world.map().free_count(), 64);
        assert_eq!(world.rooms().tile_count(world.rooms().room_id(0, 0)), 64);
    }

    #[test]
    fn test_terrain_leaves_rooms_alone() {
        let mut world = world(8);
        let handle = world.rooms().handle(0, 0).unwrap();
        world.set_terrain(TerrainKind::Red, Area::new(0, 0, 7, 7));
        assert_eq!(world.map().movement_penalty(4, 4), 4);
        assert!(world.rooms().is_current(handle));
    }

    #[test]
    fn test_edits_outside_map_are_ignored() {
        let mut world = world(8);
        world.set_block(BlockKind::Square, Area::new(20, 20, 30, 30));
        world.clear(Area::new(-9, -9, -1, -1));
        assert_eq!(world.rooms().room_count(), 1);
        assert_eq!(world.geometry().stats().clusters, 0);
    }
}
