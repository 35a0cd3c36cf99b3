//! Pipeline conversions module
//!
//! Orchestrates raw file → (input, groundtruth) pair generation, single file and batch.

mod dataset;
mod raw_to_pair;
mod timing;
pub mod types;

#[cfg(test)]
mod tests;

pub use dataset::{BatchReport, OutputDirs, find_raw_files, generate_dataset, prepare_output_dirs};
pub use raw_to_pair::{RawToPairPipeline, crop_to_even};
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use types::{DatasetConfig, DatasetConfigBuilder, ImagePair, PairPaths};
