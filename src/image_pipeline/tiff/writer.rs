use std::io::Write;

use crate::image_pipeline::common::{Raster, Result};
use crate::image_pipeline::tiff::types::TiffOptions;

/// Encodes a raster as TIFF into `output`.
pub trait TiffWriter: Send + Sync {
    fn write_tiff(&self, image: &Raster, output: &mut dyn Write, options: &TiffOptions) -> Result<()>;
}
