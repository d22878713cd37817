//! Map file I/O
//!
//! Maps are stored as RON text (`MapFile`), optionally brotli compressed.
//! Loading detects the format from the first byte and validates the
//! layout before building a `TileMap`.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use serde::{Serialize, Deserialize};

use super::map::{TileMap, MAX_MAP_SIZE};

/// On-disk map representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFile {
    /// Tiles per side
    pub size: u32,
    /// Tile layout rows, northmost first (see `TileMap::from_rows`)
    pub layout: Vec<String>,
    /// Optional terrain digit rows, northmost first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<Vec<String>>,
}

impl MapFile {
    pub fn from_map(map: &TileMap) -> Self {
        let terrain = map.terrain_rows();
        let has_terrain = terrain.iter().any(|row| row.chars().any(|c| c != '0'));
        Self {
            size: map.size(),
            layout: map.to_rows(),
            terrain: has_terrain.then_some(terrain),
        }
    }

    pub fn to_map(&self) -> Result<TileMap, MapError> {
        validate_map_file(self)?;
        let mut map = TileMap::from_rows(&self.layout).map_err(MapError::ValidationError)?;
        if let Some(terrain) = &self.terrain {
            map.apply_terrain_rows(terrain).map_err(MapError::ValidationError)?;
        }
        Ok(map)
    }
}

/// Error type for map loading
#[derive(Debug)]
pub enum MapError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for MapError {
    fn from(e: ron::error::SpannedError) -> Self {
        MapError::ParseError(e)
    }
}

impl From<ron::Error> for MapError {
    fn from(e: ron::Error) -> Self {
        MapError::SerializeError(e)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::IoError(e) => write!(f, "IO error: {}", e),
            MapError::ParseError(e) => write!(f, "Parse error: {}", e),
            MapError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            MapError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for MapError {}

/// Validate a map file before building the grid
pub fn validate_map_file(file: &MapFile) -> Result<(), MapError> {
    validate_layout(file).map_err(MapError::ValidationError)
}

fn validate_layout(file: &MapFile) -> Result<(), String> {
    if file.size == 0 {
        return Err("map size is zero".to_string());
    }
    if file.size > MAX_MAP_SIZE {
        return Err(format!("map too large ({} > {})", file.size, MAX_MAP_SIZE));
    }
    if file.layout.len() != file.size as usize {
        return Err(format!("layout has {} rows, expected {}", file.layout.len(), file.size));
    }
    for (i, row) in file.layout.iter().enumerate() {
        if let Some(c) = row.chars().find(|c| !matches!(c, '.' | '#' | 'o' | 'O' | '@' | 'x')) {
            return Err(format!("layout row {}: unknown tile '{}'", i, c));
        }
    }
    if let Some(terrain) = &file.terrain {
        if terrain.len() != file.size as usize {
            return Err(format!("terrain has {} rows, expected {}", terrain.len(), file.size));
        }
    }
    Ok(())
}

/// Load a map from a RON file (supports both compressed and uncompressed)
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<TileMap, MapError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let contents = decode_text(&bytes)?;

    let file: MapFile = match ron::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            log::error!("RON parse error in {}: {}", path.display(), e);
            let lines: Vec<&str> = contents.lines().collect();
            let line_idx = e.position.line.saturating_sub(1);
            if let Some(line) = lines.get(line_idx) {
                log::error!("  Line {}: {}", e.position.line, line);
            }
            return Err(e.into());
        }
    };

    let map = file.to_map()?;
    log::info!("loaded {}x{} map from {}", map.size(), map.size(), path.display());
    Ok(map)
}

/// Save a map to a compressed RON file (brotli)
pub fn save_map<P: AsRef<Path>>(map: &TileMap, path: P) -> Result<(), MapError> {
    let data = serialize_map(map)?;
    fs::write(path, data)?;
    Ok(())
}

/// Load a map from a RON string (for embedded maps or testing)
pub fn load_map_from_str(s: &str) -> Result<TileMap, MapError> {
    let file: MapFile = ron::from_str(s)?;
    file.to_map()
}

/// Parse map data from bytes, plain RON or brotli
pub fn parse_map_data(bytes: &[u8]) -> Result<TileMap, MapError> {
    let contents = decode_text(bytes)?;
    load_map_from_str(&contents)
}

/// Serialize a map to compressed bytes
pub fn serialize_map(map: &TileMap) -> Result<Vec<u8>, MapError> {
    let ron_string = map_to_ron(map)?;

    // Compress with brotli (quality 6, window 22)
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(ron_string.as_bytes()), &mut compressed, &brotli::enc::BrotliEncoderParams {
        quality: 6,
        lgwin: 22,
        ..Default::default()
    }).map_err(|e| MapError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("brotli compression failed: {}", e)
    )))?;

    Ok(compressed)
}

/// Plain pretty RON text for a map
pub fn map_to_ron(map: &TileMap) -> Result<String, MapError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .indentor("  ".to_string());
    Ok(ron::ser::to_string_pretty(&MapFile::from_map(map), config)?)
}

/// RON text starts with '(' or whitespace, anything else is treated as brotli
fn is_plain_ron(bytes: &[u8]) -> bool {
    bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false)
}

fn decode_text(bytes: &[u8]) -> Result<String, MapError> {
    let raw = if is_plain_ron(bytes) {
        bytes.to_vec()
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed)
            .map_err(|e| MapError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e)
            )))?;
        decompressed
    };
    String::from_utf8(raw).map_err(|e| MapError::IoError(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid UTF-8: {}", e)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockKind, TerrainKind};

    fn sample_map() -> TileMap {
        let mut map = TileMap::from_rows(&[
            "##..",
            "#..o",
            "..x.",
            "@...",
        ]).unwrap();
        map.set_terrain(TerrainKind::Green, 2, 0);
        map
    }

    #[test]
    fn test_save_and_load_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_map.ron");
        let map = sample_map();
        save_map(&map, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(!is_plain_ron(&bytes));

        let loaded = load_map(&path).unwrap();
        assert_eq!(loaded.to_rows(), map.to_rows());
        assert_eq!(loaded.terrain(2, 0), TerrainKind::Green);
        assert_eq!(loaded.block(0, 3), BlockKind::Square);
    }

    #[test]
    fn test_load_plain_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.ron");
        fs::write(&path, map_to_ron(&sample_map()).unwrap()).unwrap();
        let loaded = load_map(&path).unwrap();
        assert!(loaded.is_obstacle(2, 1));
    }

    #[test]
    fn test_load_from_str() {
        let map = load_map_from_str(r##"(size: 2, layout: ["#.", ".."])"##).unwrap();
        assert!(map.is_square(0, 1));
        assert_eq!(map.free_count(), 3);
    }

    #[test]
    fn test_validation_rejects_mismatched_rows() {
        let err = load_map_from_str(r##"(size: 3, layout: ["#.", ".."])"##).unwrap_err();
        assert!(matches!(err, MapError::ValidationError(_)));

        let err = load_map_from_str(r##"(size: 2, layout: ["#?", ".."])"##).unwrap_err();
        assert!(err.to_string().contains("unknown tile"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_map_data(b"(size: 2, layout: [").unwrap_err();
        assert!(matches!(err, MapError::ParseError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_map(dir.path().join("nope.ron")).unwrap_err();
        assert!(matches!(err, MapError::IoError(_)));
    }
}
