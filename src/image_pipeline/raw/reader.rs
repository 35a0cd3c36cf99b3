use std::path::Path;

use crate::image_pipeline::common::{Raster, Result};

/// Produces a 3-channel raster from a raw file. Failures are `DecodeError`s.
pub trait RawDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Raster>;
}
