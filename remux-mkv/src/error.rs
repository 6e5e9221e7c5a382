//! Matroska-specific error types.

use thiserror::Error;

/// Matroska muxing error types.
#[derive(Error, Debug)]
pub enum MkvError {
    /// Invalid element ID (below 0x80 or wider than 4 bytes).
    #[error("Invalid element ID: 0x{id:08X}")]
    InvalidElementId {
        /// The offending ID value.
        id: u32,
    },

    /// A fixed-width VINT cannot hold the requested value.
    #[error("VINT overflow: value exceeds maximum representable size")]
    VintOverflow,

    /// A codec reader supplied an invalid or incomplete header at commit time.
    #[error("Invalid codec parameters for track {track_number}: {message}")]
    InvalidCodecParameters {
        /// Matroska track number of the failing track.
        track_number: u64,
        /// Description of what was missing or malformed.
        message: String,
    },

    /// Track registration or lookup error.
    #[error("Track configuration error: {0}")]
    TrackConfig(String),

    /// Operation issued in the wrong lifecycle state.
    #[error("Invalid muxer state: {0}")]
    InvalidState(String),

    /// I/O error from the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<remux_av1::Av1Error> for MkvError {
    fn from(err: remux_av1::Av1Error) -> Self {
        MkvError::TrackConfig(err.to_string())
    }
}

/// Result type for Matroska operations.
pub type Result<T> = std::result::Result<T, MkvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MkvError::InvalidElementId { id: 0x7F };
        assert_eq!(err.to_string(), "Invalid element ID: 0x0000007F");

        let err = MkvError::InvalidCodecParameters {
            track_number: 2,
            message: "no SPS".to_string(),
        };
        assert!(err.to_string().contains("track 2"));
    }
}
