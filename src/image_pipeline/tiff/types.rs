//! TIFF encoding options

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// How one output image is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffOptions {
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
}

impl TiffOptions {
    /// Uncompressed, for the mosaiced input images.
    pub fn uncompressed() -> Self {
        Self {
            compression: TiffCompression::None,
            predictor: None,
        }
    }

    /// Lossless Deflate with horizontal differencing, for groundtruth images.
    pub fn lossless_compressed() -> Self {
        Self {
            compression: TiffCompression::DeflateBalanced,
            predictor: Some(2),
        }
    }
}

impl Default for TiffOptions {
    fn default() -> Self {
        Self::uncompressed()
    }
}
