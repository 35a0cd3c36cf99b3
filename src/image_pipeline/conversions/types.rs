//! Dataset generation configuration and result types

use std::path::PathBuf;

use crate::image_pipeline::common::{Raster, Result};
use crate::image_pipeline::mosaic::BayerPattern;
use crate::image_pipeline::noise::NoiseBounds;
use crate::image_pipeline::tiff::TiffOptions;
use crate::image_pipeline::tiles::TileGeometry;

/// Default edge of the square blocks averaged into one groundtruth pixel
pub const DEFAULT_BLOCK_SIZE: usize = 5;

/// Default edge of a fully subsampled tile; tiles are `block_size * multiplier` wide
pub const DEFAULT_CHUNK_MULTIPLIER: usize = 30000;

/// Subdirectory receiving the mosaiced input images
pub const INPUT_DIR_NAME: &str = "input";

/// Subdirectory receiving the groundtruth images
pub const GROUNDTRUTH_DIR_NAME: &str = "output";

/// Extension of every written image
pub const OUTPUT_EXTENSION: &str = "tiff";

/// Configuration for generating input/groundtruth pairs
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Edge of the square blocks averaged into one groundtruth pixel (>= 2)
    pub block_size: usize,
    /// Edge of a full tile after subsampling
    pub chunk_multiplier: usize,
    /// Color filter layout used for mosaicing and subsampling
    pub pattern: BayerPattern,
    /// Whether to inject estimated sensor noise into input images
    pub add_noise: bool,
    /// Limits applied to estimated noise coefficients
    pub noise_bounds: NoiseBounds,
    /// Seed for reproducible noise; `None` draws from the OS
    pub noise_seed: Option<u64>,
    /// Whether tiles of one image are processed on the rayon pool
    pub parallel_tiles: bool,
    /// Encoding of the mosaiced input images
    pub input_tiff: TiffOptions,
    /// Encoding of the groundtruth images
    pub groundtruth_tiff: TiffOptions,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            chunk_multiplier: DEFAULT_CHUNK_MULTIPLIER,
            pattern: BayerPattern::RGGB,
            add_noise: false,
            noise_bounds: NoiseBounds::default(),
            noise_seed: None,
            parallel_tiles: false,
            input_tiff: TiffOptions::uncompressed(),
            groundtruth_tiff: TiffOptions::lossless_compressed(),
        }
    }
}

impl DatasetConfig {
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder::default()
    }

    /// Checks the run-wide settings and returns the tile geometry they describe.
    pub fn validate(&self) -> Result<TileGeometry> {
        self.noise_bounds.validate()?;
        TileGeometry::new(self.block_size, self.chunk_multiplier)
    }
}

/// Builder for DatasetConfig
#[derive(Default)]
pub struct DatasetConfigBuilder {
    block_size: Option<usize>,
    chunk_multiplier: Option<usize>,
    add_noise: Option<bool>,
    noise_bounds: Option<NoiseBounds>,
    noise_seed: Option<Option<u64>>,
    parallel_tiles: Option<bool>,
    input_tiff: Option<TiffOptions>,
    groundtruth_tiff: Option<TiffOptions>,
}

impl DatasetConfigBuilder {
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn chunk_multiplier(mut self, multiplier: usize) -> Self {
        self.chunk_multiplier = Some(multiplier);
        self
    }

    pub fn add_noise(mut self, enable: bool) -> Self {
        self.add_noise = Some(enable);
        self
    }

    pub fn noise_bounds(mut self, bounds: NoiseBounds) -> Self {
        self.noise_bounds = Some(bounds);
        self
    }

    pub fn noise_seed(mut self, seed: Option<u64>) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    pub fn parallel_tiles(mut self, enable: bool) -> Self {
        self.parallel_tiles = Some(enable);
        self
    }

    pub fn input_tiff(mut self, options: TiffOptions) -> Self {
        self.input_tiff = Some(options);
        self
    }

    pub fn groundtruth_tiff(mut self, options: TiffOptions) -> Self {
        self.groundtruth_tiff = Some(options);
        self
    }

    pub fn build(self) -> DatasetConfig {
        let default = DatasetConfig::default();
        DatasetConfig {
            block_size: self.block_size.unwrap_or(default.block_size),
            chunk_multiplier: self.chunk_multiplier.unwrap_or(default.chunk_multiplier),
            pattern: default.pattern,
            add_noise: self.add_noise.unwrap_or(default.add_noise),
            noise_bounds: self.noise_bounds.unwrap_or(default.noise_bounds),
            noise_seed: self.noise_seed.unwrap_or(default.noise_seed),
            parallel_tiles: self.parallel_tiles.unwrap_or(default.parallel_tiles),
            input_tiff: self.input_tiff.unwrap_or(default.input_tiff),
            groundtruth_tiff: self.groundtruth_tiff.unwrap_or(default.groundtruth_tiff),
        }
    }
}

/// Aligned training pair produced from one raw file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    /// Single-channel mosaiced image (possibly noised)
    pub input: Raster,
    /// RGB image the model should reconstruct
    pub groundtruth: Raster,
}

/// Where the two images of a pair were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPaths {
    pub input: PathBuf,
    pub groundtruth: PathBuf,
}
