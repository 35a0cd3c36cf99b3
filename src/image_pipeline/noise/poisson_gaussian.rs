//! Native estimator for the Poissonian-Gaussian model.
//!
//! Each channel is cut into 2x2 blocks. The block mean gives the signal level and the
//! diagonal Haar detail `(p00 - p01 - p10 + p11) / 2` isolates the noise: it vanishes on
//! any locally planar signal and keeps the per-pixel noise variance unchanged. Details
//! are grouped by signal level, each group's variance is taken from the median absolute
//! deviation, and a weighted least-squares line through (level, variance) gives (a, b).

use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use tracing::trace;

use crate::image_pipeline::common::{Raster, Result};
use crate::image_pipeline::noise::estimator::NoiseModelEstimator;
use crate::image_pipeline::noise::types::NoiseModel;

/// Scale from MAD to standard deviation for normally distributed data.
const MAD_TO_SIGMA: f64 = 1.4826;

const DEFAULT_LEVELS: usize = 16;
const DEFAULT_MIN_SAMPLES_PER_LEVEL: usize = 32;

#[derive(Debug, Clone)]
pub struct PoissonGaussianEstimator {
    levels: usize,
    min_samples_per_level: usize,
}

impl Default for PoissonGaussianEstimator {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS,
            min_samples_per_level: DEFAULT_MIN_SAMPLES_PER_LEVEL,
        }
    }
}

#[derive(Default)]
struct LevelSamples {
    mean_sum: f64,
    details: Vec<f64>,
}

/// One (level, variance) observation with its sample count as weight.
struct LevelVariance {
    level: f64,
    variance: f64,
    weight: f64,
}

impl PoissonGaussianEstimator {
    pub fn new(levels: usize, min_samples_per_level: usize) -> Self {
        Self {
            levels: levels.max(1),
            min_samples_per_level: min_samples_per_level.max(1),
        }
    }

    fn collect_levels(&self, tile: &Raster) -> Vec<LevelSamples> {
        let scale = f64::from(tile.max_value());
        let mut levels: Vec<LevelSamples> =
            (0..self.levels).map(|_| LevelSamples::default()).collect();

        for channel in 0..tile.channels() {
            for y in (0..tile.height() - 1).step_by(2) {
                for x in (0..tile.width() - 1).step_by(2) {
                    let p00 = f64::from(tile.sample(x, y, channel)) / scale;
                    let p01 = f64::from(tile.sample(x + 1, y, channel)) / scale;
                    let p10 = f64::from(tile.sample(x, y + 1, channel)) / scale;
                    let p11 = f64::from(tile.sample(x + 1, y + 1, channel)) / scale;

                    let mean = (p00 + p01 + p10 + p11) / 4.0;
                    let detail = (p00 - p01 - p10 + p11) / 2.0;
                    let index = ((mean * self.levels as f64) as usize).min(self.levels - 1);

                    let level = &mut levels[index];
                    level.mean_sum += mean;
                    level.details.push(detail);
                }
            }
        }

        levels
    }
}

impl NoiseModelEstimator for PoissonGaussianEstimator {
    fn estimate(&self, tile: &Raster) -> Result<Vec<NoiseModel>> {
        if tile.width() < 2 || tile.height() < 2 {
            return Ok(Vec::new());
        }

        let levels = self.collect_levels(tile);
        let mut observations: Vec<LevelVariance> = Vec::new();
        let mut pooled = LevelSamples::default();

        for mut level in levels {
            if level.details.len() >= self.min_samples_per_level {
                observations.push(level_variance(level.mean_sum, &mut level.details));
            } else {
                pooled.mean_sum += level.mean_sum;
                pooled.details.append(&mut level.details);
            }
        }

        // sparse tiles: fall back to one observation over everything
        if observations.is_empty() {
            if pooled.details.is_empty() {
                return Ok(Vec::new());
            }
            observations.push(level_variance(pooled.mean_sum, &mut pooled.details));
        }

        let model = fit_variance_line(&observations);
        trace!(
            "Estimated noise a={:.6} b={:.6} from {} levels",
            model.a,
            model.b,
            observations.len()
        );
        Ok(vec![model])
    }

    fn apply(&self, tile: &Raster, model: NoiseModel, rng: &mut StdRng) -> Result<Raster> {
        if model.is_noiseless() {
            return Ok(tile.clone());
        }

        let scale = f64::from(tile.max_value());
        let data = tile
            .data()
            .iter()
            .map(|&value| {
                let y = f64::from(value) / scale;
                let sigma = model.sigma_at(y);
                if sigma == 0.0 {
                    return value;
                }
                let z: f64 = rng.sample(StandardNormal);
                ((y + sigma * z).clamp(0.0, 1.0) * scale).round() as u16
            })
            .collect();

        tile.with_data(data)
    }
}

fn level_variance(mean_sum: f64, details: &mut [f64]) -> LevelVariance {
    let count = details.len() as f64;
    let sigma = MAD_TO_SIGMA * median_absolute_deviation(details);
    LevelVariance {
        level: mean_sum / count,
        variance: sigma * sigma,
        weight: count,
    }
}

fn median(values: &mut [f64]) -> f64 {
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    let mid = len / 2;
    let (lower, &mut upper_median, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    if len % 2 == 1 {
        upper_median
    } else {
        let lower_median = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower_median + upper_median) / 2.0
    }
}

fn median_absolute_deviation(values: &mut [f64]) -> f64 {
    let center = median(values);
    for value in values.iter_mut() {
        *value = (*value - center).abs();
    }
    median(values)
}

/// Weighted least squares for `variance = a * level + b`.
fn fit_variance_line(observations: &[LevelVariance]) -> NoiseModel {
    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for obs in observations {
        sw += obs.weight;
        sx += obs.weight * obs.level;
        sy += obs.weight * obs.variance;
        sxx += obs.weight * obs.level * obs.level;
        sxy += obs.weight * obs.level * obs.variance;
    }

    let denominator = sw * sxx - sx * sx;
    if denominator.abs() <= f64::EPSILON * sw * sxx.max(1.0) {
        return NoiseModel::new(0.0, sy / sw);
    }

    let a = (sw * sxy - sx * sy) / denominator;
    let b = (sy - a * sx) / sw;
    NoiseModel::new(a, b)
}
