use crate::image_pipeline::common::{DatasetError, Result};
use crate::image_pipeline::mosaic::MIN_BLOCK_SIZE;

/// Validated relationship between block size and tile edge.
///
/// `tile_edge = block_size * multiplier`, so subsampling a full tile gives exactly
/// `multiplier` pixels per edge. The joiner relies on that as its stride. The
/// multiplier must be even: tile offsets then keep Bayer parity in both the decoded
/// raster and the subsampled output, so tiled and untiled processing agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    block_size: usize,
    multiplier: usize,
    tile_edge: usize,
}

impl TileGeometry {
    pub fn new(block_size: usize, multiplier: usize) -> Result<Self> {
        if block_size < MIN_BLOCK_SIZE {
            return Err(DatasetError::InvalidBlockSize(block_size));
        }
        if multiplier == 0 || multiplier % 2 != 0 {
            return Err(DatasetError::InvalidConfig(format!(
                "chunk multiplier must be a positive even integer, got {multiplier}"
            )));
        }
        let tile_edge = block_size.checked_mul(multiplier).ok_or_else(|| {
            DatasetError::InvalidConfig(format!(
                "tile edge {block_size} * {multiplier} overflows"
            ))
        })?;

        Ok(Self {
            block_size,
            multiplier,
            tile_edge,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Edge length of a full tile after subsampling; the join stride.
    pub fn output_stride(&self) -> usize {
        self.multiplier
    }

    /// Edge length of a full tile in the decoded raster.
    pub fn tile_edge(&self) -> usize {
        self.tile_edge
    }
}
