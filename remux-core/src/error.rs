//! Error types shared by the remux crates.

use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bitstream parsing errors.
    #[error("Bitstream error: {0}")]
    Bitstream(#[from] BitstreamError),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Bit-level parsing errors.
#[derive(Error, Debug)]
pub enum BitstreamError {
    /// Ran out of bits mid-field.
    #[error("Unexpected end of bitstream")]
    UnexpectedEnd,

    /// A variable-length code exceeded its representable range.
    #[error("Variable-length code overflow")]
    UvlcOverflow,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
