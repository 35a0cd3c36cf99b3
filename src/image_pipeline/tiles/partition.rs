use tracing::debug;

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::tiles::grid::{TileGrid, TilePosition};

/// Splits `raster` into tiles of at most `tile_edge` x `tile_edge` pixels.
///
/// Rasters with fewer than `tile_edge²` pixels become a single tile. Otherwise tiles
/// are copied out row by row, the last row and column clipped at the raster border,
/// and the parent buffer is dropped before returning.
pub fn partition(raster: Raster, tile_edge: usize) -> Result<TileGrid<Raster>> {
    if tile_edge == 0 {
        return Err(DatasetError::InvalidConfig(
            "tile edge must be positive".to_string(),
        ));
    }

    let (width, height) = raster.dimensions();
    let pixel_budget = tile_edge.saturating_mul(tile_edge);
    if width.saturating_mul(height) < pixel_budget {
        debug!("{}x{} raster fits in a single tile", width, height);
        return Ok(TileGrid::single(raster));
    }

    let rows = height.div_ceil(tile_edge);
    let columns = width.div_ceil(tile_edge);
    debug!(
        "Partitioning {}x{} raster into {}x{} tiles of edge {}",
        width, height, rows, columns, tile_edge
    );

    let mut cells = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        let top = row * tile_edge;
        let bottom = ((row + 1) * tile_edge).min(height);
        for column in 0..columns {
            let left = column * tile_edge;
            let right = ((column + 1) * tile_edge).min(width);
            cells.push(raster.crop(left, top, right - left, bottom - top)?);
        }
    }
    drop(raster);

    TileGrid::from_cells(rows, columns, cells)
}

/// Places tile (r, c) at (`c * stride`, `r * stride`) in a new raster.
///
/// Every tile outside the last column must be exactly `stride` wide and every tile
/// outside the last row exactly `stride` tall; anything else would leave gaps or
/// overlaps and is reported as a dimension mismatch.
pub fn join(grid: &TileGrid<Raster>, stride: usize) -> Result<Raster> {
    let last_column = grid.columns() - 1;
    let last_row = grid.rows() - 1;
    let first = tile(grid, 0, 0)?;
    let channels = first.channels();
    let bits_per_sample = first.bits_per_sample();
    let last_width = tile(grid, 0, last_column)?.width();
    let last_height = tile(grid, last_row, 0)?.height();

    for (position, tile) in grid.iter() {
        let expected_width = if position.column == last_column {
            last_width
        } else {
            stride
        };
        let expected_height = if position.row == last_row {
            last_height
        } else {
            stride
        };
        if tile.width() != expected_width || tile.height() != expected_height {
            return Err(DatasetError::DimensionMismatch(format!(
                "tile ({}, {}) is {}x{}, expected {}x{} for stride {}",
                position.row,
                position.column,
                tile.width(),
                tile.height(),
                expected_width,
                expected_height,
                stride
            )));
        }
        if tile.channels() != channels {
            return Err(DatasetError::InvalidChannels {
                expected: channels,
                got: tile.channels(),
            });
        }
    }

    let width = last_column * stride + last_width;
    let height = last_row * stride + last_height;
    let row_len = width * channels;
    let mut data = vec![0u16; row_len * height];

    for (position, tile) in grid.iter() {
        let x0 = position.column * stride;
        let y0 = position.row * stride;
        let tile_row_len = tile.width() * channels;
        for y in 0..tile.height() {
            let start = (y0 + y) * row_len + x0 * channels;
            data[start..start + tile_row_len].copy_from_slice(tile.row(y));
        }
    }

    Raster::new(width, height, channels, bits_per_sample, data)
}

fn tile(grid: &TileGrid<Raster>, row: usize, column: usize) -> Result<&Raster> {
    grid.get(TilePosition { row, column }).ok_or_else(|| {
        DatasetError::DimensionMismatch(format!("tile ({row}, {column}) missing from grid"))
    })
}
