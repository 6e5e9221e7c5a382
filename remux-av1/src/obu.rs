//! Open Bitstream Unit framing: OBU headers and LEB128 size fields.

use crate::error::{Av1Error, Result};

/// OBU type codes (AV1 spec Section 6.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObuType {
    /// Sequence header.
    SequenceHeader,
    /// Temporal delimiter (access unit boundary marker).
    TemporalDelimiter,
    /// Frame header.
    FrameHeader,
    /// Tile group.
    TileGroup,
    /// Metadata.
    Metadata,
    /// Frame (header + tile group).
    Frame,
    /// Redundant frame header.
    RedundantFrameHeader,
    /// Tile list.
    TileList,
    /// Padding.
    Padding,
    /// Reserved type code.
    Reserved(u8),
}

impl ObuType {
    /// Create from the 4-bit type code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::SequenceHeader,
            2 => Self::TemporalDelimiter,
            3 => Self::FrameHeader,
            4 => Self::TileGroup,
            5 => Self::Metadata,
            6 => Self::Frame,
            7 => Self::RedundantFrameHeader,
            8 => Self::TileList,
            15 => Self::Padding,
            other => Self::Reserved(other & 0x0F),
        }
    }

    /// The 4-bit type code.
    pub fn code(&self) -> u8 {
        match self {
            Self::SequenceHeader => 1,
            Self::TemporalDelimiter => 2,
            Self::FrameHeader => 3,
            Self::TileGroup => 4,
            Self::Metadata => 5,
            Self::Frame => 6,
            Self::RedundantFrameHeader => 7,
            Self::TileList => 8,
            Self::Padding => 15,
            Self::Reserved(code) => *code,
        }
    }

    /// True for FRAME and FRAME_HEADER, the units that begin a coded frame.
    pub fn starts_frame(&self) -> bool {
        matches!(self, Self::Frame | Self::FrameHeader)
    }
}

/// A parsed OBU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObuHeader {
    /// The OBU type.
    pub obu_type: ObuType,
    /// Whether the extension byte (temporal/spatial id) is present.
    pub extension_flag: bool,
    /// Whether a LEB128 size field follows the header.
    pub has_size_field: bool,
    /// Temporal layer id (0 without extension byte).
    pub temporal_id: u8,
    /// Spatial layer id (0 without extension byte).
    pub spatial_id: u8,
}

impl ObuHeader {
    /// Parse an OBU header from the start of `buf`.
    ///
    /// Returns the header and the number of bytes it occupies (1 or 2).
    /// Rejects headers with the forbidden bit or the reserved bit set.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let &b0 = buf.first().ok_or(Av1Error::InvalidObuHeader)?;

        // obu_forbidden_bit and obu_reserved_1bit must both be 0
        if b0 & 0x80 != 0 || b0 & 0x01 != 0 {
            return Err(Av1Error::InvalidObuHeader);
        }

        let obu_type = ObuType::from_code((b0 >> 3) & 0x0F);
        let extension_flag = (b0 >> 2) & 1 != 0;
        let has_size_field = (b0 >> 1) & 1 != 0;

        if extension_flag {
            let &b1 = buf.get(1).ok_or(Av1Error::InvalidObuHeader)?;
            Ok((
                Self {
                    obu_type,
                    extension_flag,
                    has_size_field,
                    temporal_id: (b1 >> 5) & 0x07,
                    spatial_id: (b1 >> 3) & 0x03,
                },
                2,
            ))
        } else {
            Ok((
                Self {
                    obu_type,
                    extension_flag,
                    has_size_field,
                    temporal_id: 0,
                    spatial_id: 0,
                },
                1,
            ))
        }
    }
}

/// Encode a value as LEB128 (AV1 spec Section 4.10.5).
///
/// Returns the encoded bytes; at most 8 for values below 2^56.
pub fn encode_leb128(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(2);
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
    out
}

/// Decode a LEB128 value from the start of `buf`.
///
/// Returns the value and the number of bytes consumed. Fails when the
/// source is exhausted or the continuation bit survives the 8th byte.
pub fn decode_leb128(buf: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for i in 0..8 {
        let &byte = buf.get(i).ok_or(Av1Error::InvalidLeb128)?;
        value |= u64::from(byte & 0x7F) << (i * 7);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Av1Error::InvalidLeb128)
}

/// Extract the config OBUs from an `AV1CodecConfigurationRecord` and re-emit
/// each as a start-code-prefixed OBU.
///
/// The record's OBUs carry LEB128 size fields; the start-code form carries
/// none, so the size bit is cleared and emulation prevention is applied to
/// the payload. Returns an error when the marker bit or version is wrong;
/// walking stops silently at the first malformed OBU.
pub fn extract_config_obus(record: &[u8]) -> Result<Vec<Vec<u8>>> {
    if record.len() < 4 {
        return Err(Av1Error::InvalidConfigRecord("shorter than 4 bytes".into()));
    }
    if record[0] & 0x80 == 0 {
        return Err(Av1Error::InvalidConfigRecord("marker bit clear".into()));
    }
    let version = record[0] & 0x7F;
    if version != 1 {
        return Err(Av1Error::InvalidConfigRecord(format!("version {version}")));
    }

    let mut result = Vec::new();
    let mut cur = &record[4..];

    while !cur.is_empty() {
        let Ok((hdr, hdr_len)) = ObuHeader::parse(cur) else {
            break;
        };
        if !hdr.has_size_field {
            // Without a size field the OBU boundary is unknowable
            break;
        }
        let Ok((payload_size, leb_len)) = decode_leb128(&cur[hdr_len..]) else {
            break;
        };
        let payload_size = payload_size as usize;
        let total = hdr_len + leb_len + payload_size;
        if cur.len() < total {
            break;
        }

        let mut obu = Vec::with_capacity(3 + hdr_len + payload_size);
        obu.extend_from_slice(&[0x00, 0x00, 0x01]);
        obu.push(cur[0] & !0x02); // clear obu_has_size_field
        if hdr.extension_flag {
            obu.push(cur[1]);
        }
        let payload = &cur[hdr_len + leb_len..total];
        obu.extend_from_slice(&remux_core::bitstream::add_emulation_prevention(payload));

        result.push(obu);
        cur = &cur[total..];
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obu_type_codes() {
        assert_eq!(ObuType::from_code(1), ObuType::SequenceHeader);
        assert_eq!(ObuType::from_code(2), ObuType::TemporalDelimiter);
        assert_eq!(ObuType::from_code(6), ObuType::Frame);
        assert_eq!(ObuType::from_code(15), ObuType::Padding);
        assert_eq!(ObuType::from_code(9), ObuType::Reserved(9));

        for code in 0..16u8 {
            assert_eq!(ObuType::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_obu_header_parse() {
        // type=1 (sequence header), no extension, no size field
        let buf = [0x08];
        let (hdr, len) = ObuHeader::parse(&buf).unwrap();
        assert_eq!(len, 1);
        assert_eq!(hdr.obu_type, ObuType::SequenceHeader);
        assert!(!hdr.extension_flag);
        assert!(!hdr.has_size_field);

        // type=6 (frame), size field set
        let buf = [0x32];
        let (hdr, _) = ObuHeader::parse(&buf).unwrap();
        assert_eq!(hdr.obu_type, ObuType::Frame);
        assert!(hdr.has_size_field);
    }

    #[test]
    fn test_obu_header_extension() {
        // type=4 (tile group), extension flag, temporal_id=2, spatial_id=1
        let buf = [0x24, (2 << 5) | (1 << 3)];
        let (hdr, len) = ObuHeader::parse(&buf).unwrap();
        assert_eq!(len, 2);
        assert_eq!(hdr.obu_type, ObuType::TileGroup);
        assert_eq!(hdr.temporal_id, 2);
        assert_eq!(hdr.spatial_id, 1);
    }

    #[test]
    fn test_obu_header_rejects_forbidden_and_reserved() {
        assert!(ObuHeader::parse(&[0x88]).is_err()); // forbidden bit
        assert!(ObuHeader::parse(&[0x09]).is_err()); // reserved bit
        assert!(ObuHeader::parse(&[]).is_err()); // empty
        assert!(ObuHeader::parse(&[0x0C]).is_err()); // extension flag without byte
    }

    #[test]
    fn test_leb128_literals() {
        assert_eq!(encode_leb128(0), vec![0x00]);
        assert_eq!(encode_leb128(127), vec![0x7F]);
        assert_eq!(encode_leb128(128), vec![0x80, 0x01]);
        assert_eq!(encode_leb128(624_485), vec![0xE5, 0x8E, 0x26]);

        assert_eq!(decode_leb128(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_leb128(&[0x7F]).unwrap(), (127, 1));
        assert_eq!(decode_leb128(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_leb128(&[0xE5, 0x8E, 0x26]).unwrap(), (624_485, 3));
    }

    #[test]
    fn test_leb128_errors() {
        // Exhausted source mid-value
        assert!(decode_leb128(&[0x80]).is_err());
        assert!(decode_leb128(&[]).is_err());
        // Continuation bit still set on the 8th byte
        assert!(decode_leb128(&[0x80; 9]).is_err());
    }

    #[test]
    fn test_leb128_roundtrip() {
        for value in [0u64, 1, 127, 128, 16383, 16384, (1 << 56) - 1] {
            let encoded = encode_leb128(value);
            let (decoded, len) = decode_leb128(&encoded).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(len, encoded.len());
        }
    }

    #[test]
    fn test_extract_config_obus() {
        // Record header + one sequence-header OBU with size field
        let payload = [0xAA, 0xBB, 0xCC];
        let mut record = vec![0x81, 0x00, 0x00, 0x00];
        record.push(0x0A); // type=1, has_size_field=1
        record.extend(encode_leb128(payload.len() as u64));
        record.extend_from_slice(&payload);

        let obus = extract_config_obus(&record).unwrap();
        assert_eq!(obus.len(), 1);
        assert_eq!(&obus[0][..3], &[0x00, 0x00, 0x01]);
        assert_eq!(obus[0][3], 0x08); // size bit cleared
        assert_eq!(&obus[0][4..], &payload);
    }

    #[test]
    fn test_extract_config_obus_rejects_bad_record() {
        assert!(extract_config_obus(&[0x81, 0x00]).is_err()); // too short
        assert!(extract_config_obus(&[0x01, 0, 0, 0]).is_err()); // marker clear
        assert!(extract_config_obus(&[0x82, 0, 0, 0]).is_err()); // version 2
    }

    #[test]
    fn test_extract_config_obus_stops_at_truncated_obu() {
        // Valid record header, then an OBU whose size field overruns
        let mut record = vec![0x81, 0x00, 0x00, 0x00];
        record.push(0x0A);
        record.extend(encode_leb128(100));
        record.push(0xAA);

        let obus = extract_config_obus(&record).unwrap();
        assert!(obus.is_empty());
    }
}
