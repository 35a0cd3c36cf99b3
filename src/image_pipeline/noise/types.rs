//! Noise model types

use crate::image_pipeline::common::{DatasetError, Result};

/// Coefficients of the variance model `var(y) = a * y + b`, with `y` the sample value
/// normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    /// Signal-dependent (Poissonian) part
    pub a: f64,
    /// Signal-independent (Gaussian) part
    pub b: f64,
}

impl NoiseModel {
    pub const NONE: NoiseModel = NoiseModel { a: 0.0, b: 0.0 };

    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Standard deviation of the noise at normalized level `y`.
    #[inline]
    pub fn sigma_at(&self, y: f64) -> f64 {
        (self.a * y + self.b).max(0.0).sqrt()
    }

    pub fn is_noiseless(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }
}

/// Upper limits applied to estimated coefficients; both lower limits are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBounds {
    pub a_max: f64,
    pub b_max: f64,
}

impl Default for NoiseBounds {
    fn default() -> Self {
        Self {
            a_max: 0.01,
            b_max: 0.0004,
        }
    }
}

impl NoiseBounds {
    /// Checks that both limits are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("a_max", self.a_max), ("b_max", self.b_max)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DatasetError::InvalidConfig(format!(
                    "noise bound {name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Clamps `model` into `[0, a_max] x [0, b_max]`. Non-finite coefficients become zero.
    pub fn clamp(&self, model: NoiseModel) -> NoiseModel {
        NoiseModel {
            a: clamp_coefficient(model.a, self.a_max),
            b: clamp_coefficient(model.b, self.b_max),
        }
    }
}

fn clamp_coefficient(value: f64, max: f64) -> f64 {
    if !value.is_finite() {
        0.0
    } else {
        value.max(0.0).min(max)
    }
}
