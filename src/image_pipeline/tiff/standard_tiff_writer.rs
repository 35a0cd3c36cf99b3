use std::io::{Cursor, Write};

use tiff::encoder::colortype::{Gray8, Gray16, RGB8, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::tiff::types::{TiffCompression, TiffOptions};
use crate::image_pipeline::tiff::writer::TiffWriter;

/// Rasters up to this depth are written with 8-bit samples.
const EIGHT_BIT_DEPTH: u32 = 8;

pub struct StandardTiffWriter;

impl TiffWriter for StandardTiffWriter {
    fn write_tiff(&self, image: &Raster, output: &mut dyn Write, options: &TiffOptions) -> Result<()> {
        debug!(
            "Encoding TIFF image: {}x{}x{} at {} bits",
            image.width(),
            image.height(),
            image.channels(),
            image.bits_per_sample()
        );

        if image.is_empty() {
            return Err(DatasetError::InvalidDimensions(image.width(), image.height()));
        }

        let mut buffer = Vec::new();
        let compression = match options.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| DatasetError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = options.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        let width = image.width() as u32;
        let height = image.height() as u32;
        let eight_bit = image.bits_per_sample() <= EIGHT_BIT_DEPTH;
        let written = match (image.channels(), eight_bit) {
            (1, true) => encoder.write_image::<Gray8>(width, height, &narrow(image.data())),
            (1, false) => encoder.write_image::<Gray16>(width, height, image.data()),
            (3, true) => encoder.write_image::<RGB8>(width, height, &narrow(image.data())),
            (3, false) => encoder.write_image::<RGB16>(width, height, image.data()),
            (channels, _) => {
                return Err(DatasetError::InvalidChannels {
                    expected: 3,
                    got: channels,
                });
            }
        };
        written.map_err(|e| DatasetError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

fn narrow(data: &[u16]) -> Vec<u8> {
    data.iter().map(|&v| v.min(u16::from(u8::MAX)) as u8).collect()
}
