use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode raw image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid block size {0}: must be an integer >= 2")]
    InvalidBlockSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Noise estimation failed: {0}")]
    EstimationError(String),

    #[error("Noise synthesis failed: {0}")]
    SynthesisError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Expected {expected} channel(s), got {got}")]
    InvalidChannels { expected: usize, got: usize },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Output directory already exists: {}", .0.display())]
    OutputDirectoryExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
