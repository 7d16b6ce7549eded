//! Error types for the watermark-removal crate.

use std::path::PathBuf;

/// Errors that can occur while removing a watermark region.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input image could not be read or decoded.
    #[error("cannot open image {path}: {source}")]
    CannotOpenImage {
        /// Path of the offending file.
        path: PathBuf,
        /// Decoder error reported by the image crate.
        source: image::ImageError,
    },

    /// A region literal could not be parsed.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// A backend's runtime or model weights are not available.
    ///
    /// Never escapes a backend's `fill`: the deep backend converts it
    /// into a logged fallback to the classical fill.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
