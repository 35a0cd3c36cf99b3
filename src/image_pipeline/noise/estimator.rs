use rand::rngs::StdRng;

use crate::image_pipeline::common::{Raster, Result};
use crate::image_pipeline::noise::types::NoiseModel;

/// Fits a noise model to a tile and synthesizes noise following a model.
pub trait NoiseModelEstimator: Send + Sync {
    /// Models found in `tile` (3-channel, full resolution). Callers expect exactly one.
    fn estimate(&self, tile: &Raster) -> Result<Vec<NoiseModel>>;

    /// Returns `tile` with every sample perturbed according to `model`.
    fn apply(&self, tile: &Raster, model: NoiseModel, rng: &mut StdRng) -> Result<Raster>;
}
