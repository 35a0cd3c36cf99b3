use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::mosaic::pattern::{BayerPattern, CHANNEL_COUNT};

/// Smallest block that is guaranteed to contain a sample of every channel.
pub const MIN_BLOCK_SIZE: usize = 2;

/// Averages same-channel samples of a mosaiced raster over `block_size` square blocks.
///
/// Output is `floor(width / block_size)` x `floor(height / block_size)` RGB pixels.
/// Trailing rows and columns that do not fill a whole block are dropped. Each channel
/// is the floor of the integer mean of the samples the pattern assigns to it.
pub fn subsample(mosaiced: &Raster, block_size: usize, pattern: &BayerPattern) -> Result<Raster> {
    if block_size < MIN_BLOCK_SIZE {
        return Err(DatasetError::InvalidBlockSize(block_size));
    }
    if mosaiced.channels() != 1 {
        return Err(DatasetError::InvalidChannels {
            expected: 1,
            got: mosaiced.channels(),
        });
    }

    let out_width = mosaiced.width() / block_size;
    let out_height = mosaiced.height() / block_size;
    let mut data = Vec::with_capacity(out_width * out_height * CHANNEL_COUNT);

    for block_y in 0..out_height {
        for block_x in 0..out_width {
            let mut sums = [0u64; CHANNEL_COUNT];
            let mut counts = [0u64; CHANNEL_COUNT];

            for y in block_y * block_size..(block_y + 1) * block_size {
                let row = mosaiced.row(y);
                for x in block_x * block_size..(block_x + 1) * block_size {
                    let channel = pattern.channel_at(x, y);
                    sums[channel] += u64::from(row[x]);
                    counts[channel] += 1;
                }
            }

            // counts are non-zero for every channel once block_size >= 2
            for channel in 0..CHANNEL_COUNT {
                data.push((sums[channel] / counts[channel]) as u16);
            }
        }
    }

    Raster::new(
        out_width,
        out_height,
        CHANNEL_COUNT,
        mosaiced.bits_per_sample(),
        data,
    )
}
