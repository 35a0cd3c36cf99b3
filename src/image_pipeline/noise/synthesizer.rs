use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::noise::estimator::NoiseModelEstimator;
use crate::image_pipeline::noise::types::{NoiseBounds, NoiseModel};

/// Odd 64-bit constant used to spread tile indices across the seed space.
const STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-tile estimate, clamp and inject.
pub struct NoiseSynthesizer<E: NoiseModelEstimator> {
    estimator: E,
    bounds: NoiseBounds,
    seed: Option<u64>,
}

impl<E: NoiseModelEstimator> NoiseSynthesizer<E> {
    pub fn new(estimator: E, bounds: NoiseBounds, seed: Option<u64>) -> Self {
        Self {
            estimator,
            bounds,
            seed,
        }
    }

    /// Estimates the model of a clean 3-channel tile and clamps it into bounds.
    pub fn estimate(&self, tile: &Raster) -> Result<NoiseModel> {
        let models = self.estimator.estimate(tile)?;
        match models.as_slice() {
            [model] => {
                let clamped = self.bounds.clamp(*model);
                debug!(
                    "Noise model a={:.6} b={:.6} (clamped to a={:.6} b={:.6})",
                    model.a, model.b, clamped.a, clamped.b
                );
                Ok(clamped)
            }
            others => Err(DatasetError::EstimationError(format!(
                "expected exactly one noise model, estimator returned {}",
                others.len()
            ))),
        }
    }

    /// Injects `model` noise into a mosaiced tile.
    ///
    /// `stream` identifies the tile; with a fixed seed the same stream always gets the
    /// same noise, whichever order tiles are processed in.
    pub fn apply(&self, mosaiced: &Raster, model: NoiseModel, stream: u64) -> Result<Raster> {
        let mut rng = self.rng_for(stream);
        let noised = self.estimator.apply(mosaiced, model, &mut rng)?;

        if noised.dimensions() != mosaiced.dimensions()
            || noised.channels() != mosaiced.channels()
        {
            return Err(DatasetError::SynthesisError(format!(
                "noised tile is {}x{}x{}, expected {}x{}x{}",
                noised.width(),
                noised.height(),
                noised.channels(),
                mosaiced.width(),
                mosaiced.height(),
                mosaiced.channels()
            )));
        }
        Ok(noised)
    }

    pub fn bounds(&self) -> &NoiseBounds {
        &self.bounds
    }

    fn rng_for(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ stream.wrapping_add(1).wrapping_mul(STREAM_MIX)),
            None => StdRng::from_os_rng(),
        }
    }
}
