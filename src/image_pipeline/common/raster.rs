//! Owned interleaved sample buffer shared by every pipeline stage.

use crate::image_pipeline::common::error::{DatasetError, Result};

/// Largest sample depth a raster can carry (samples are stored as `u16`).
pub const MAX_BITS_PER_SAMPLE: u32 = 16;

/// A width x height grid of `u16` samples with `channels` interleaved values per pixel.
///
/// Rasters never change after construction. Transforms build new rasters, and tiles are
/// always copied out of their parent so they own their storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    channels: usize,
    bits_per_sample: u32,
    data: Vec<u16>,
}

impl Raster {
    /// Wraps `data`, checking that its length is `width * height * channels`.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        data: Vec<u16>,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(DatasetError::InvalidChannels {
                expected: 1,
                got: 0,
            });
        }
        if bits_per_sample == 0 || bits_per_sample > MAX_BITS_PER_SAMPLE {
            return Err(DatasetError::InvalidConfig(format!(
                "bits per sample must be in 1..={MAX_BITS_PER_SAMPLE}, got {bits_per_sample}"
            )));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(DatasetError::InvalidDimensions(width, height))?;
        if data.len() != expected {
            return Err(DatasetError::DimensionMismatch(format!(
                "buffer holds {} samples, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            bits_per_sample,
            data,
        })
    }

    /// A raster where every sample equals `value`.
    pub fn filled(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        value: u16,
    ) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or(DatasetError::InvalidDimensions(width, height))?;
        Self::new(width, height, channels, bits_per_sample, vec![value; len])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u16> {
        self.data
    }

    /// Largest value a sample can take at this raster's bit depth.
    pub fn max_value(&self) -> u16 {
        ((1u32 << self.bits_per_sample) - 1) as u16
    }

    /// Sample of channel `channel` at column `x`, row `y`.
    ///
    /// Panics if the coordinates are out of bounds, like slice indexing.
    #[inline]
    pub fn sample(&self, x: usize, y: usize, channel: usize) -> u16 {
        debug_assert!(x < self.width && y < self.height && channel < self.channels);
        self.data[(y * self.width + x) * self.channels + channel]
    }

    /// Samples of one row, all channels interleaved.
    #[inline]
    pub fn row(&self, y: usize) -> &[u16] {
        let stride = self.width * self.channels;
        &self.data[y * stride..(y + 1) * stride]
    }

    /// A raster with the same geometry and depth holding `data` instead.
    pub fn with_data(&self, data: Vec<u16>) -> Result<Self> {
        Self::new(
            self.width,
            self.height,
            self.channels,
            self.bits_per_sample,
            data,
        )
    }

    /// Copies the `width` x `height` region whose top-left corner is (`x`, `y`).
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        if x + width > self.width || y + height > self.height {
            return Err(DatasetError::DimensionMismatch(format!(
                "crop {}x{} at ({}, {}) exceeds {}x{} raster",
                width, height, x, y, self.width, self.height
            )));
        }

        let mut data = Vec::with_capacity(width * height * self.channels);
        for row in y..y + height {
            let start = (row * self.width + x) * self.channels;
            data.extend_from_slice(&self.data[start..start + width * self.channels]);
        }

        Self::new(width, height, self.channels, self.bits_per_sample, data)
    }
}
