//! World module - the tile grid and everything kept in step with it
//!
//! - `TileMap` stores obstacles, occluder blocks and terrain
//! - `World` applies edits so rooms and occluder geometry stay consistent
//! - Scenarios replay scripted edits and lights from RON files

mod area;
mod generate;
mod io;
mod map;
mod scenario;
mod state;

pub use area::Area;
pub use generate::generate_map;
pub use io::*;
pub use map::*;
pub use scenario::*;
pub use state::World;
