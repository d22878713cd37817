//! Scripted edit and light runs
//!
//! A scenario names a map, an optional config, a list of edits applied in
//! order and a list of lights built at the end:
//!
//! ```text
//! Scenario(
//!     map: Rows(["....", ".#..", "....", "...."]),
//!     edits: [
//!         Block(kind: Square, area: (0, 0, 3, 0)),
//!         Clear((1, 0, 1, 0)),
//!     ],
//!     lights: [(x: 2.5, y: 2.5, radius: 3.0)],
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::config::Config;
use crate::geometry::GeometryStats;
use crate::light::{Color, Light2D};
use crate::math::Vec2;
use super::io::{load_map, MapError};
use super::{Area, BlockKind, TerrainKind, TileMap, World, MAX_MAP_SIZE};

/// Corners (x0, y0, x1, y1), inclusive, in any order
pub type Span = (i32, i32, i32, i32);

fn span_area(span: Span) -> Area {
    Area::new(span.0, span.1, span.2, span.3)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapSource {
    /// Empty map of the given size
    Empty(u32),
    /// Inline layout rows, northmost first
    Rows(Vec<String>),
    /// Map file, relative to the scenario file
    File(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Edit {
    Block { kind: BlockKind, area: Span },
    Obstacle(Span),
    Clear(Span),
    Terrain { kind: TerrainKind, area: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub map: MapSource,
    #[serde(default)]
    pub config: Option<Config>,
    #[serde(default)]
    pub edits: Vec<Edit>,
    #[serde(default)]
    pub lights: Vec<LightSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightReport {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Fan vertices, origin included
    pub vertices: usize,
    pub valid: bool,
}

/// Outcome of a scenario run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub map_size: u32,
    pub free_tiles: usize,
    pub rooms: usize,
    pub largest_room: u32,
    pub geometry: GeometryStats,
    pub lights: Vec<LightReport>,
}

impl Scenario {
    /// Use `config` unless the scenario carries its own
    pub fn with_default_config(mut self, config: Config) -> Self {
        self.config.get_or_insert(config);
        self
    }
}

/// Load a scenario file
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, MapError> {
    let contents = fs::read_to_string(path.as_ref())?;
    Ok(ron::from_str(&contents)?)
}

/// Build the world, apply every edit in order, then build the lights.
/// Map files are resolved against `base_dir`.
pub fn run_scenario(scenario: &Scenario, base_dir: &Path) -> Result<ScenarioReport, MapError> {
    let config = scenario.config.unwrap_or_default();
    config.validate().map_err(MapError::ValidationError)?;

    let map = match &scenario.map {
        MapSource::Empty(size) => {
            if *size == 0 || *size > MAX_MAP_SIZE {
                return Err(MapError::ValidationError(format!(
                    "map size {} out of range [1, {}]", size, MAX_MAP_SIZE
                )));
            }
            TileMap::new(*size)
        }
        MapSource::Rows(rows) => TileMap::from_rows(rows).map_err(MapError::ValidationError)?,
        MapSource::File(file) => load_map(base_dir.join(file))?,
    };

    let mut world = World::new(map, &config);
    for edit in &scenario.edits {
        match *edit {
            Edit::Block { kind, area } => world.set_block(kind, span_area(area)),
            Edit::Obstacle(area) => world.place_obstacle(span_area(area)),
            Edit::Clear(area) => world.clear(span_area(area)),
            Edit::Terrain { kind, area } => world.set_terrain(kind, span_area(area)),
        }
    }
    log::debug!("applied {} edits", scenario.edits.len());

    let mut lights: Vec<Light2D> = scenario
        .lights
        .iter()
        .map(|spec| {
            let light = Light2D::new(Vec2::new(spec.x, spec.y), spec.radius);
            match spec.color {
                Some(color) => light.with_color(color),
                None => light,
            }
        })
        .collect();
    world.update_lights(&mut lights);

    let rooms = world.rooms();
    Ok(ScenarioReport {
        map_size: world.map().size(),
        free_tiles: world.map().free_count(),
        rooms: rooms.room_count(),
        largest_room: rooms.rooms().map(|(_, count)| count).max().unwrap_or(0),
        geometry: world.geometry().stats(),
        lights: lights
            .iter()
            .map(|light| LightReport {
                x: light.origin().x,
                y: light.origin().y,
                radius: light.radius(),
                vertices: light.vertex_count(),
                valid: light.is_valid(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::save_map;

    const SCENARIO: &str = r#"
Scenario(
    map: Empty(16),
    edits: [
        Block(kind: Square, area: (0, 8, 15, 8)),
        Clear((7, 8, 7, 8)),
        Block(kind: Circle(Large), area: (3, 3, 3, 3)),
        Obstacle((12, 2, 12, 2)),
        Terrain(kind: Blue, area: (0, 0, 3, 3)),
    ],
    lights: [
        (x: 7.5, y: 4.5, radius: 3.0),
        (x: -40.0, y: 4.5, radius: 3.0, color: Some((r: 255, g: 128, b: 0, a: 255))),
    ],
)
"#;

    #[test]
    fn test_run_inline_scenario() {
        let scenario: Scenario = ron::from_str(SCENARIO).unwrap();
        let report = run_scenario(&scenario, Path::new(".")).unwrap();
        assert_eq!(report.map_size, 16);
        // Wall of 15 squares, one circle, one plain obstacle
        assert_eq!(report.free_tiles, 256 - 17);
        assert_eq!(report.rooms, 1);
        assert_eq!(report.largest_room, 256 - 17);
        assert_eq!(report.geometry.clusters, 2);
        assert_eq!(report.geometry.circles, 1);
        assert_eq!(report.lights.len(), 2);
        assert!(report.lights[0].valid);
        assert!(!report.lights[1].valid);
        assert_eq!(report.lights[1].vertices, 1);
    }

    #[test]
    fn test_scenario_with_map_file() {
        let dir = tempfile::tempdir().unwrap();
        let map = TileMap::from_rows(&["....", "####", "....", "...."]).unwrap();
        save_map(&map, dir.path().join("wall.ron")).unwrap();
        let scenario_path = dir.path().join("scenario.ron");
        fs::write(&scenario_path, r#"(map: File("wall.ron"), edits: [Clear((0, 2, 0, 2))])"#).unwrap();

        let scenario = load_scenario(&scenario_path).unwrap();
        let report = run_scenario(&scenario, dir.path()).unwrap();
        assert_eq!(report.rooms, 1);
        assert_eq!(report.free_tiles, 13);
    }

    #[test]
    fn test_bad_scenarios_are_errors() {
        let scenario: Scenario = ron::from_str(r#"(map: Rows(["..", "."]))"#).unwrap();
        assert!(matches!(run_scenario(&scenario, Path::new(".")), Err(MapError::ValidationError(_))));

        let scenario: Scenario = ron::from_str("(map: Empty(0))").unwrap();
        assert!(run_scenario(&scenario, Path::new(".")).is_err());

        let scenario: Scenario = ron::from_str("(map: Empty(4097))").unwrap();
        assert!(matches!(run_scenario(&scenario, Path::new(".")), Err(MapError::ValidationError(_))));

        let scenario: Scenario = ron::from_str("(map: File(\"does-not-exist.ron\"))").unwrap();
        assert!(matches!(run_scenario(&scenario, Path::new(".")), Err(MapError::IoError(_))));
    }

    #[test]
    fn test_default_config_fills_only_missing() {
        let mut fallback = Config::default();
        fallback.rooms.split_window_margin = 9;

        let bare: Scenario = ron::from_str("(map: Empty(8))").unwrap();
        let bare = bare.with_default_config(fallback);
        assert_eq!(bare.config, Some(fallback));

        let own: Scenario = ron::from_str("(map: Empty(8), config: Some((rooms: (split_window_margin: 2))))").unwrap();
        let own = own.with_default_config(fallback);
        assert_eq!(own.config.unwrap().rooms.split_window_margin, 2);

        // A bad fallback is caught when the scenario runs
        fallback.rooms.split_window_margin = 0;
        let bare: Scenario = ron::from_str("(map: Empty(8))").unwrap();
        assert!(run_scenario(&bare.with_default_config(fallback), Path::new(".")).is_err());
    }
}
