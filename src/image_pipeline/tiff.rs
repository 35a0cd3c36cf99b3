//! TIFF writing module
//!
//! Encodes single-channel input images and RGB groundtruth images.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{TiffCompression, TiffOptions};
pub use writer::TiffWriter;
