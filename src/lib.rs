//! gridlight: tile-map rooms and 2D shadow casting
//!
//! - `rooms` keeps connected free regions labelled while the map is edited
//! - `geometry` turns occluder tiles into merged edges and circles, cached per quadrant
//! - `light` builds visibility polygons against that geometry
//! - `world` ties the map, rooms and geometry together behind one edit API

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod geometry;
pub mod light;
pub mod math;
pub mod rooms;
pub mod spatial;
pub mod world;
