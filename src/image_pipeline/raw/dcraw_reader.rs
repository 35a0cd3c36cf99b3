//! RAW decoding through the external `dcraw` tool.
//!
//! dcraw writes a PNM image to stdout, which is decoded with the `image` crate.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::raw::reader::RawDecoder;

const DEFAULT_PROGRAM: &str = "dcraw";

/// Write to stdout, camera white balance, 16-bit output.
const DEFAULT_ARGS: [&str; 3] = ["-c", "-W", "-6"];

pub struct DcrawReader {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for DcrawReader {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.into(),
            args: DEFAULT_ARGS.iter().map(OsString::from).collect(),
        }
    }
}

impl DcrawReader {
    /// Uses `program` instead of `dcraw` from `PATH`, with the default arguments.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }
}

impl RawDecoder for DcrawReader {
    fn decode(&self, path: &Path) -> Result<Raster> {
        debug!(
            "Running {} on {}",
            self.program.to_string_lossy(),
            path.display()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| {
                DatasetError::DecodeError(format!(
                    "failed to run {}: {}",
                    self.program.to_string_lossy(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(DatasetError::DecodeError(format!(
                "{} exited with {} for {}: {}",
                self.program.to_string_lossy(),
                output.status,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        raster_from_pnm(&output.stdout)
    }
}

/// Decodes a PNM byte stream into an RGB raster, keeping 8-bit images at 8 bits.
fn raster_from_pnm(bytes: &[u8]) -> Result<Raster> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Pnm)
        .map_err(|e| DatasetError::DecodeError(format!("invalid dcraw output: {e}")))?;
    raster_from_image(image)
}

fn raster_from_image(image: DynamicImage) -> Result<Raster> {
    let eight_bit = matches!(
        image.color(),
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
    );

    if eight_bit {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        let data = rgb.into_raw().into_iter().map(u16::from).collect();
        Raster::new(width as usize, height as usize, 3, 8, data)
    } else {
        let rgb = image.into_rgb16();
        let (width, height) = rgb.dimensions();
        Raster::new(width as usize, height as usize, 3, 16, rgb.into_raw())
    }
}
