//! Common utilities module
//!
//! Shared error type and the raster container every stage passes around.

pub mod error;
pub mod raster;

pub use error::{DatasetError, Result};
pub use raster::Raster;
