//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The two buffers handed to a stage do not share the same dimensions.
    #[error("Dimension mismatch: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize)
    },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not load or save image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse parameters: {0}")]
    Config(#[from] serde_json::Error),

    #[cfg(feature = "statistics")]
    #[error("Could not plot statistics: {0}")]
    Plotting(String)
}
