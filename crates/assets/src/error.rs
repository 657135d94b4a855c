//! Error types for the assets crate.

use deploid_core::{Error, ErrorCode};
use thiserror::Error;

/// Result type alias for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Errors that can occur while producing icons.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source is neither SVG nor a supported raster format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// The SVG could not be parsed
    #[error("Invalid SVG: {0}")]
    Svg(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Decoding or encoding failed
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

impl From<AssetError> for Error {
    fn from(err: AssetError) -> Self {
        let message = err.to_string();
        Error::native(ErrorCode::AssetError, message).with_source(err)
    }
}
