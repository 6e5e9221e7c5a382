//! AV1-specific error types.

use thiserror::Error;

/// AV1 bitstream error types.
#[derive(Error, Debug)]
pub enum Av1Error {
    /// OBU header failed validation (forbidden or reserved bit set).
    #[error("Invalid OBU header")]
    InvalidObuHeader,

    /// A LEB128 size field overran its source or exceeded 8 bytes.
    #[error("Invalid LEB128 value")]
    InvalidLeb128,

    /// Sequence header fields are out of range or truncated.
    #[error("Invalid sequence header: {0}")]
    InvalidSequenceHeader(String),

    /// Frame header fields are out of range or truncated.
    #[error("Invalid frame header")]
    InvalidFrameHeader,

    /// Codec configuration record failed validation.
    #[error("Invalid configuration record: {0}")]
    InvalidConfigRecord(String),

    /// Underlying bit-level parsing error.
    #[error(transparent)]
    Core(#[from] remux_core::Error),
}

impl From<remux_core::BitstreamError> for Av1Error {
    fn from(err: remux_core::BitstreamError) -> Self {
        Av1Error::Core(err.into())
    }
}

/// Result type for AV1 operations.
pub type Result<T> = std::result::Result<T, Av1Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Av1Error::InvalidSequenceHeader("profile 5".to_string());
        assert_eq!(err.to_string(), "Invalid sequence header: profile 5");
    }
}
