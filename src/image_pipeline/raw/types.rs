//! RAW sensor data types

use bayer::CFA;

/// Single-channel sensor read-out as stored in the raw file
#[derive(Debug, Clone)]
pub struct SensorData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Raw pixel data, one sample per photosite
    pub data: Vec<u16>,
    /// Color filter layout of the top-left 2x2 block
    pub cfa: CFA,
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
}
