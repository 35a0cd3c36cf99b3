//! Image processing pipeline module
//!
//! Raw decoding, tiling, Bayer mosaicing, block subsampling, noise synthesis and TIFF
//! writing, tied together by the pair-generation orchestration in `conversions`.

pub mod common;
pub mod conversions;
pub mod mosaic;
pub mod noise;
pub mod raw;
pub mod tiff;
pub mod tiles;

pub use common::{DatasetError, Raster, Result};

pub use raw::{DcrawReader, RawDecoder, RawLoaderReader, SensorData};

pub use mosaic::{BayerPattern, mosaic, subsample};

pub use tiles::{TileGeometry, TileGrid, TilePosition, join, partition};

pub use noise::{NoiseBounds, NoiseModel, NoiseModelEstimator, NoiseSynthesizer, PoissonGaussianEstimator};

pub use self::tiff::{StandardTiffWriter, TiffCompression, TiffOptions, TiffWriter};

pub use conversions::{
    BatchReport, DatasetConfig, DatasetConfigBuilder, ImagePair, OutputDirs, PairPaths,
    PipelineTimings, RawToPairPipeline, crop_to_even, find_raw_files, generate_dataset,
    prepare_output_dirs,
};
