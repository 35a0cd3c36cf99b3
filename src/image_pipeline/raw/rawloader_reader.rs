//! RAW image reader implementation using the rawloader library.
//!
//! Supports every format rawloader can decode (ARW, CR2, NEF, DNG, ...). Bayer sensor
//! data is demosaiced with the `bayer` crate so the pipeline always starts from RGB.

use std::io::Cursor;
use std::path::Path;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use rawloader::RawImageData as RawloaderImageData;
use tracing::{debug, warn};

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::raw::reader::RawDecoder;
use crate::image_pipeline::raw::types::SensorData;

/// RAW decoder backed by rawloader and a linear demosaic.
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

const RGB_CHANNELS: usize = 3;

impl RawDecoder for RawLoaderReader {
    fn decode(&self, path: &Path) -> Result<Raster> {
        let bytes = std::fs::read(path)
            .map_err(|e| DatasetError::DecodeError(format!("{}: {}", path.display(), e)))?;
        self.decode_bytes(&bytes)
    }
}

impl RawLoaderReader {
    /// Decodes an in-memory raw file into an RGB raster.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<Raster> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| DatasetError::DecodeError(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        debug!(
            "Decoded image: {}x{}, {} component(s) per pixel",
            width, height, decoded.cpp
        );

        // Integer data is cast directly, float data (normalized 0.0-1.0) is scaled to u16 range
        let samples: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values.iter().map(|&v| v as u16).collect(),
            RawloaderImageData::Float(values) => values
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16)
                .collect(),
        };

        let bits_per_sample = bits_from_white_levels(&decoded.whitelevels);
        debug!("Calculated bits_per_sample: {}", bits_per_sample);

        match decoded.cpp {
            1 => demosaic(&SensorData {
                width,
                height,
                data: samples,
                cfa: cfa_from_name(&decoded.cfa.name),
                bits_per_sample,
            }),
            RGB_CHANNELS => Raster::new(width, height, RGB_CHANNELS, bits_per_sample, samples),
            other => Err(DatasetError::DecodeError(format!(
                "unsupported raw layout with {other} components per pixel"
            ))),
        }
    }
}

/// Smallest bit depth able to hold the sensor's brightest white level.
fn bits_from_white_levels(white_levels: &[u16]) -> u32 {
    let max_white_level = white_levels.iter().max().copied().unwrap_or(u16::MAX);
    if max_white_level == 0 {
        DEFAULT_BITS_PER_SAMPLE
    } else {
        // e.g. 4095 (0xFFF) -> 12 bits, 16383 (0x3FFF) -> 14 bits
        U16_BITS - max_white_level.leading_zeros()
    }
}

fn cfa_from_name(name: &str) -> CFA {
    match name {
        "RGGB" => CFA::RGGB,
        "BGGR" => CFA::BGGR,
        "GRBG" => CFA::GRBG,
        "GBRG" => CFA::GBRG,
        other => {
            warn!("Unsupported CFA layout '{}', assuming RGGB", other);
            CFA::RGGB
        }
    }
}

/// Linear demosaic of single-channel sensor data to an RGB raster.
pub(crate) fn demosaic(sensor: &SensorData) -> Result<Raster> {
    let (width, height) = (sensor.width, sensor.height);
    if width == 0 || height == 0 {
        return Err(DatasetError::InvalidDimensions(width, height));
    }

    // bayer crate only supports 8 and 16 bit
    let (bayer_depth, raster_depth, bytes_per_sample) = if sensor.bits_per_sample <= 8 {
        (BayerDepth::Depth8, RasterDepth::Depth8, 1)
    } else {
        (BayerDepth::Depth16LE, RasterDepth::Depth16, 2)
    };

    let bayer_bytes: Vec<u8> = if bytes_per_sample == 1 {
        sensor.data.iter().map(|&v| v as u8).collect()
    } else {
        sensor.data.iter().flat_map(|&v| v.to_le_bytes()).collect()
    };

    let mut output_buf = vec![0u8; width * height * RGB_CHANNELS * bytes_per_sample];
    let mut output_raster = RasterMut::new(width, height, raster_depth, &mut output_buf);

    debug!(
        "Running demosaic with depth={:?}, CFA={:?}, algo=Linear",
        bayer_depth, sensor.cfa
    );
    bayer::run_demosaic(
        &mut Cursor::new(&bayer_bytes[..]),
        bayer_depth,
        sensor.cfa,
        Demosaic::Linear,
        &mut output_raster,
    )
    .map_err(|e| DatasetError::DecodeError(format!("demosaic failed: {e:?}")))?;

    let rgb: Vec<u16> = if bytes_per_sample == 1 {
        output_buf.iter().map(|&v| u16::from(v)).collect()
    } else {
        output_buf
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .collect()
    };

    Raster::new(width, height, RGB_CHANNELS, sensor.bits_per_sample, rgb)
}
