//! Signal-dependent sensor noise
//!
//! Estimates a Poissonian-Gaussian model `var(y) = a * y + b` from a clean tile and
//! injects matching noise into the mosaiced tile derived from it.

mod estimator;
mod poisson_gaussian;
mod synthesizer;
pub mod types;

pub use estimator::NoiseModelEstimator;
pub use poisson_gaussian::PoissonGaussianEstimator;
pub use synthesizer::NoiseSynthesizer;
pub use types::{NoiseBounds, NoiseModel};
