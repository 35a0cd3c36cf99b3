use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::mosaic::pattern::{BayerPattern, CHANNEL_COUNT};

/// Keeps, for every pixel, only the channel the color filter at that position passes.
///
/// Output has the input's width, height and bit depth and a single channel. This is a
/// one-way transform: subsampling the result and mosaicing again does not give back the
/// original samples.
pub fn mosaic(image: &Raster, pattern: &BayerPattern) -> Result<Raster> {
    if image.channels() != CHANNEL_COUNT {
        return Err(DatasetError::InvalidChannels {
            expected: CHANNEL_COUNT,
            got: image.channels(),
        });
    }

    let mut data = Vec::with_capacity(image.width() * image.height());
    for y in 0..image.height() {
        let row = image.row(y);
        data.extend(
            row.chunks_exact(CHANNEL_COUNT)
                .enumerate()
                .map(|(x, pixel)| pixel[pattern.channel_at(x, y)]),
        );
    }

    Raster::new(
        image.width(),
        image.height(),
        1,
        image.bits_per_sample(),
        data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(width: usize, height: usize, pixel: [u16; 3]) -> Raster {
        let data = (0..width * height).flat_map(|_| pixel).collect();
        Raster::new(width, height, 3, 16, data).unwrap()
    }

    #[test]
    fn selects_channel_by_parity() {
        let image = rgb(4, 2, [10, 20, 30]);
        let mosaiced = mosaic(&image, &BayerPattern::RGGB).unwrap();

        assert_eq!(mosaiced.channels(), 1);
        assert_eq!(mosaiced.dimensions(), (4, 2));
        assert_eq!(mosaiced.data(), &[10, 20, 10, 20, 20, 30, 20, 30]);
    }

    #[test]
    fn constant_image_stays_constant() {
        let image = rgb(5, 3, [100, 100, 100]);
        let mosaiced = mosaic(&image, &BayerPattern::RGGB).unwrap();
        assert!(mosaiced.data().iter().all(|&v| v == 100));
    }

    #[test]
    fn keeps_odd_dimensions_and_depth() {
        let data = (0..3 * 3 * 3).map(|v| v as u16).collect();
        let image = Raster::new(3, 3, 3, 12, data).unwrap();
        let mosaiced = mosaic(&image, &BayerPattern::RGGB).unwrap();

        assert_eq!(mosaiced.dimensions(), (3, 3));
        assert_eq!(mosaiced.bits_per_sample(), 12);
        // (x=2, y=2) is even/even -> red, pixel index 8 -> sample 24
        assert_eq!(mosaiced.sample(2, 2, 0), 24);
    }

    #[test]
    fn rejects_single_channel_input() {
        let image = Raster::filled(2, 2, 1, 16, 0).unwrap();
        assert!(matches!(
            mosaic(&image, &BayerPattern::RGGB),
            Err(DatasetError::InvalidChannels { expected: 3, got: 1 })
        ));
    }
}
