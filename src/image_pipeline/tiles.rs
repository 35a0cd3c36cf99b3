//! Tile partitioning and reassembly
//!
//! Splits a raster into a bounded-size grid so per-tile work never touches more than
//! one tile of memory, and joins processed grids back with a fixed stride.

mod geometry;
mod grid;
mod partition;

pub use geometry::TileGeometry;
pub use grid::{TileGrid, TilePosition};
pub use partition::{join, partition};
