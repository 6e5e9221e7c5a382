//! AV1 uncompressed frame header prefix.
//!
//! Only the leading fields are parsed: enough to classify the frame type
//! and the show flag for keyframe detection.

use crate::error::{Av1Error, Result};
use crate::sequence::SequenceHeader;
use remux_core::bitstream::{remove_emulation_prevention, BitReader};

/// AV1 frame types (AV1 spec Section 6.8.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Key frame (random access point).
    Key,
    /// Inter frame.
    Inter,
    /// Intra-only frame.
    IntraOnly,
    /// Switch frame.
    Switch,
}

impl FrameType {
    fn from_code(code: u32) -> Self {
        match code & 0x03 {
            0 => Self::Key,
            1 => Self::Inter,
            2 => Self::IntraOnly,
            _ => Self::Switch,
        }
    }

    /// Whether this frame type is a random access point.
    pub fn is_intra(&self) -> bool {
        matches!(self, Self::Key | Self::IntraOnly)
    }
}

/// The parsed prefix of an uncompressed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// show_existing_frame flag.
    pub show_existing_frame: bool,
    /// The frame type (KEY when showing an existing frame).
    pub frame_type: FrameType,
    /// show_frame flag.
    pub show_frame: bool,
    /// frame_to_show_map_idx when showing an existing frame.
    pub frame_to_show_map_idx: u8,
}

impl FrameHeader {
    /// Parse the frame header prefix from a FRAME or FRAME_HEADER OBU
    /// payload (emulation prevention bytes still present).
    ///
    /// The sequence header decides whether the reduced still-picture form
    /// applies, in which case the frame is always a shown key frame.
    pub fn parse(payload: &[u8], seq: &SequenceHeader) -> Result<Self> {
        if payload.is_empty() {
            return Err(Av1Error::InvalidFrameHeader);
        }

        if seq.reduced_still_picture_header {
            return Ok(Self {
                show_existing_frame: false,
                frame_type: FrameType::Key,
                show_frame: true,
                frame_to_show_map_idx: 0,
            });
        }

        // Only the first few bytes matter
        let prefix = &payload[..payload.len().min(16)];
        let data = remove_emulation_prevention(prefix);
        let mut r = BitReader::new(&data);

        let show_existing_frame = r.read_bit().map_err(|_| Av1Error::InvalidFrameHeader)?;
        if show_existing_frame {
            let idx = r.read_bits(3).map_err(|_| Av1Error::InvalidFrameHeader)? as u8;
            return Ok(Self {
                show_existing_frame: true,
                frame_type: FrameType::Key,
                show_frame: true,
                frame_to_show_map_idx: idx,
            });
        }

        let frame_type =
            FrameType::from_code(r.read_bits(2).map_err(|_| Av1Error::InvalidFrameHeader)?);
        let show_frame = r.read_bit().map_err(|_| Av1Error::InvalidFrameHeader)?;

        Ok(Self {
            show_existing_frame: false,
            frame_type,
            show_frame,
            frame_to_show_map_idx: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_frame() {
        let seq = SequenceHeader::default();
        // show_existing=0, frame_type=00 (KEY), show_frame=1
        let hdr = FrameHeader::parse(&[0b0001_0000], &seq).unwrap();
        assert!(!hdr.show_existing_frame);
        assert_eq!(hdr.frame_type, FrameType::Key);
        assert!(hdr.show_frame);
        assert!(hdr.frame_type.is_intra());
    }

    #[test]
    fn test_inter_frame() {
        let seq = SequenceHeader::default();
        // show_existing=0, frame_type=01 (INTER), show_frame=1
        let hdr = FrameHeader::parse(&[0b0011_0000], &seq).unwrap();
        assert_eq!(hdr.frame_type, FrameType::Inter);
        assert!(!hdr.frame_type.is_intra());
    }

    #[test]
    fn test_show_existing_frame() {
        let seq = SequenceHeader::default();
        // show_existing=1, map_idx=0b101
        let hdr = FrameHeader::parse(&[0b1101_0000], &seq).unwrap();
        assert!(hdr.show_existing_frame);
        assert_eq!(hdr.frame_to_show_map_idx, 5);
        assert!(hdr.show_frame);
    }

    #[test]
    fn test_reduced_still_picture() {
        let seq = SequenceHeader {
            reduced_still_picture_header: true,
            ..Default::default()
        };
        // Payload bits irrelevant under the reduced header
        let hdr = FrameHeader::parse(&[0xFF], &seq).unwrap();
        assert_eq!(hdr.frame_type, FrameType::Key);
        assert!(hdr.show_frame);
    }

    #[test]
    fn test_empty_payload() {
        let seq = SequenceHeader::default();
        assert!(FrameHeader::parse(&[], &seq).is_err());
    }
}
