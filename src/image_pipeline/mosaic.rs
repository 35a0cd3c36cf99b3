//! Bayer mosaic and block subsampling
//!
//! Sensor read-out simulation (3 channels to 1) and the block averaging that turns a
//! mosaiced tile into its reduced-resolution groundtruth.

pub mod pattern;
mod subsample;
mod transform;

pub use pattern::BayerPattern;
pub use subsample::{MIN_BLOCK_SIZE, subsample};
pub use transform::mosaic;
