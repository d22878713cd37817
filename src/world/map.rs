//! Tile map storage
//!
//! The map is a square grid of cells. Each cell carries an obstacle flag, an
//! occluder kind (`BlockKind`) and a terrain kind. The map itself is passive:
//! it answers queries and stores edits, while rooms and occluder geometry are
//! derived from it by `Rooms` and `Geometry`.
//!
//! Coordinates: x grows east, y grows north, (0, 0) is the south-west tile.

use serde::{Serialize, Deserialize};

use super::Area;

/// Side of a map region in tiles
pub const REGION_SIZE: i32 = 32;

/// Side of a region quadrant in tiles (the unit of occluder rebuilds)
pub const QUADRANT_SIZE: i32 = REGION_SIZE / 2;

/// Largest map side accepted from files
pub const MAX_MAP_SIZE: u32 = 4096;

/// Radius class of a circular occluder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CircleTier {
    Small,
    Medium,
    Large,
}

impl CircleTier {
    pub const ALL: [CircleTier; 3] = [CircleTier::Small, CircleTier::Medium, CircleTier::Large];

    /// Radius in tile units
    pub fn radius(self) -> f32 {
        match self {
            CircleTier::Small => 0.25,
            CircleTier::Medium => 0.375,
            CircleTier::Large => 0.5,
        }
    }
}

/// What kind of light occluder sits on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    None,
    /// Full tile block, merged into clusters
    Square,
    /// Round obstacle centered in the tile
    Circle(CircleTier),
}

impl BlockKind {
    pub fn is_square(self) -> bool {
        matches!(self, BlockKind::Square)
    }

    /// Does this block occlude light at all?
    pub fn is_occluder(self) -> bool {
        !matches!(self, BlockKind::None)
    }
}

/// Ground layer of a tile. Terrain never makes a tile an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    #[default]
    Clear,
    Alpha,
    Blue,
    Green,
    Red,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 5] = [
        TerrainKind::Clear,
        TerrainKind::Alpha,
        TerrainKind::Blue,
        TerrainKind::Green,
        TerrainKind::Red,
    ];

    /// Extra movement cost for AI walking over this terrain
    pub fn movement_penalty(self) -> u32 {
        match self {
            TerrainKind::Clear => 0,
            TerrainKind::Alpha => 1,
            TerrainKind::Blue => 2,
            TerrainKind::Green => 1,
            TerrainKind::Red => 4,
        }
    }

    /// Digit used in terrain rows
    pub fn digit(self) -> char {
        match self {
            TerrainKind::Clear => '0',
            TerrainKind::Alpha => '1',
            TerrainKind::Blue => '2',
            TerrainKind::Green => '3',
            TerrainKind::Red => '4',
        }
    }

    pub fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(TerrainKind::Clear),
            '1' => Some(TerrainKind::Alpha),
            '2' => Some(TerrainKind::Blue),
            '3' => Some(TerrainKind::Green),
            '4' => Some(TerrainKind::Red),
            _ => None,
        }
    }
}

/// Standard map sizes (power of two sides)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl MapSize {
    /// Side length in tiles
    pub fn size(self) -> u32 {
        match self {
            MapSize::Tiny => 64,
            MapSize::Small => 128,
            MapSize::Medium => 256,
            MapSize::Large => 512,
            MapSize::Huge => 1024,
            MapSize::Gargantuan => 2048,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MapSize::Tiny => "Tiny",
            MapSize::Small => "Small",
            MapSize::Medium => "Medium",
            MapSize::Large => "Large",
            MapSize::Huge => "Huge",
            MapSize::Gargantuan => "Gargantuan",
        }
    }
}

/// Square tile grid
#[derive(Debug, Clone)]
pub struct TileMap {
    size: u32,
    obstacles: Vec<bool>,
    blocks: Vec<BlockKind>,
    terrain: Vec<TerrainKind>,
}

impl TileMap {
    /// Empty map (no obstacles) with `size` tiles per side
    pub fn new(size: u32) -> Self {
        assert!(size > 0, "map size must be positive");
        let count = size as usize * size as usize;
        Self {
            size,
            obstacles: vec![false; count],
            blocks: vec![BlockKind::None; count],
            terrain: vec![TerrainKind::Clear; count],
        }
    }

    pub fn with_size(size: MapSize) -> Self {
        Self::new(size.size())
    }

    /// Parse a text layout, northmost row first.
    ///
    /// `.` free, `#` square block, `o` / `O` / `@` small / medium / large
    /// circle, `x` obstacle that does not occlude light. Occluders are
    /// always obstacles.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, String> {
        let size = rows.len();
        if size == 0 {
            return Err("map has no rows".to_string());
        }
        if size as u32 > MAX_MAP_SIZE {
            return Err(format!("map too large ({} > {})", size, MAX_MAP_SIZE));
        }
        let mut map = TileMap::new(size as u32);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let y = (size - 1 - i) as i32;
            if row.chars().count() != size {
                return Err(format!(
                    "row {}: length {} does not match map size {}",
                    i, row.chars().count(), size
                ));
            }
            for (x, c) in row.chars().enumerate() {
                let x = x as i32;
                match c {
                    '.' => {}
                    'x' => map.set_obstacle(x, y, true),
                    _ => {
                        let kind = block_from_char(c)
                            .ok_or_else(|| format!("row {}: unknown tile '{}' at column {}", i, c, x))?;
                        map.set_block(kind, x, y);
                        map.set_obstacle(x, y, true);
                    }
                }
            }
        }
        Ok(map)
    }

    /// Apply terrain rows (digits), northmost row first
    pub fn apply_terrain_rows<S: AsRef<str>>(&mut self, rows: &[S]) -> Result<(), String> {
        if rows.len() != self.size as usize {
            return Err(format!(
                "terrain has {} rows, map size is {}",
                rows.len(), self.size
            ));
        }
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let y = (self.size as usize - 1 - i) as i32;
            if row.chars().count() != self.size as usize {
                return Err(format!("terrain row {}: length {} does not match map size {}",
                    i, row.chars().count(), self.size));
            }
            for (x, c) in row.chars().enumerate() {
                let kind = TerrainKind::from_digit(c)
                    .ok_or_else(|| format!("terrain row {}: unknown terrain '{}' at column {}", i, c, x))?;
                self.set_terrain(kind, x as i32, y);
            }
        }
        Ok(())
    }

    /// Text layout, northmost row first (inverse of `from_rows`)
    pub fn to_rows(&self) -> Vec<String> {
        let s = self.size as i32;
        (0..s)
            .rev()
            .map(|y| {
                (0..s)
                    .map(|x| match self.block(x, y) {
                        BlockKind::None if self.is_obstacle(x, y) => 'x',
                        BlockKind::None => '.',
                        kind => block_char(kind),
                    })
                    .collect()
            })
            .collect()
    }

    /// Terrain digits, northmost row first
    pub fn terrain_rows(&self) -> Vec<String> {
        let s = self.size as i32;
        (0..s)
            .rev()
            .map(|y| (0..s).map(|x| self.terrain(x, y).digit()).collect())
            .collect()
    }

    /// Tiles per side
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Total tile count
    pub fn tile_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Bounds of the whole map
    pub fn area(&self) -> Area {
        Area::new(0, 0, self.size as i32 - 1, self.size as i32 - 1)
    }

    /// Regions per side (edge regions may be partially outside the map)
    pub fn regions_per_side(&self) -> i32 {
        (self.size as i32 + REGION_SIZE - 1) / REGION_SIZE
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.size as i32 && y < self.size as i32
    }

    fn index(&self, x: i32, y: i32) -> usize {
        assert!(self.in_bounds(x, y), "tile ({}, {}) outside {}x{} map", x, y, self.size, self.size);
        x as usize + y as usize * self.size as usize
    }

    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.obstacles[self.index(x, y)]
    }

    pub fn block(&self, x: i32, y: i32) -> BlockKind {
        self.blocks[self.index(x, y)]
    }

    pub fn is_square(&self, x: i32, y: i32) -> bool {
        self.block(x, y).is_square()
    }

    pub fn terrain(&self, x: i32, y: i32) -> TerrainKind {
        self.terrain[self.index(x, y)]
    }

    pub fn movement_penalty(&self, x: i32, y: i32) -> u32 {
        self.terrain(x, y).movement_penalty()
    }

    /// Number of tiles that are not obstacles
    pub fn free_count(&self) -> usize {
        self.obstacles.iter().filter(|&&o| !o).count()
    }

    pub fn set_obstacle(&mut self, x: i32, y: i32, obstacle: bool) {
        let idx = self.index(x, y);
        self.obstacles[idx] = obstacle;
    }

    pub fn set_block(&mut self, kind: BlockKind, x: i32, y: i32) {
        let idx = self.index(x, y);
        self.blocks[idx] = kind;
    }

    pub fn set_terrain(&mut self, kind: TerrainKind, x: i32, y: i32) {
        let idx = self.index(x, y);
        self.terrain[idx] = kind;
    }

    /// Set the obstacle flag over an area (clamped to the map)
    pub fn set_obstacle_area(&mut self, area: Area, obstacle: bool) {
        if let Some(area) = self.area().intersection(&area) {
            for (x, y) in area.tiles() {
                self.set_obstacle(x, y, obstacle);
            }
        }
    }

    /// Set the block kind over an area (clamped to the map)
    pub fn set_block_area(&mut self, kind: BlockKind, area: Area) {
        if let Some(area) = self.area().intersection(&area) {
            for (x, y) in area.tiles() {
                self.set_block(kind, x, y);
            }
        }
    }

    /// Set the terrain over an area (clamped to the map)
    pub fn set_terrain_area(&mut self, kind: TerrainKind, area: Area) {
        if let Some(area) = self.area().intersection(&area) {
            for (x, y) in area.tiles() {
                self.set_terrain(kind, x, y);
            }
        }
    }
}

fn block_char(kind: BlockKind) -> char {
    match kind {
        BlockKind::None => '.',
        BlockKind::Square => '#',
        BlockKind::Circle(CircleTier::Small) => 'o',
        BlockKind::Circle(CircleTier::Medium) => 'O',
        BlockKind::Circle(CircleTier::Large) => '@',
    }
}

fn block_from_char(c: char) -> Option<BlockKind> {
    match c {
        '#' => Some(BlockKind::Square),
        'o' => Some(BlockKind::Circle(CircleTier::Small)),
        'O' => Some(BlockKind::Circle(CircleTier::Medium)),
        '@' => Some(BlockKind::Circle(CircleTier::Large)),
        _ => None,
    }
}
