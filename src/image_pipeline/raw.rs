//! RAW image reading module
//!
//! Decoders that turn a vendor raw file into a 3-channel raster.

mod dcraw_reader;
mod rawloader_reader;
mod reader;
pub mod types;

pub use dcraw_reader::DcrawReader;
pub use rawloader_reader::RawLoaderReader;
pub use reader::RawDecoder;
pub use types::SensorData;
