//! EBML serialization primitives.
//!
//! Writers for variable-length integers (VINTs), element IDs and typed
//! elements. Every writer returns the number of bytes emitted so callers
//! can chain them when sizing master elements.

use crate::error::{MkvError, Result};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

/// Maximum VINT width in bytes.
pub const MAX_VINT_WIDTH: usize = 8;

/// Number of bytes needed to encode `value` as a data-size VINT.
///
/// Widths are chosen by inclusive boundaries: 0..=0x7F in one byte,
/// 0..=0x3FFF in two, and so on. Values at a boundary encode with all data
/// bits set (127 becomes `FF`), which Matroska tolerates.
pub fn vint_size(value: u64) -> usize {
    if value <= 0x7F {
        1
    } else if value <= 0x3FFF {
        2
    } else if value <= 0x1F_FFFF {
        3
    } else if value <= 0x0FFF_FFFF {
        4
    } else if value <= 0x07_FFFF_FFFF {
        5
    } else if value <= 0x03FF_FFFF_FFFF {
        6
    } else if value <= 0x01_FFFF_FFFF_FFFF {
        7
    } else {
        8
    }
}

/// Write a data-size VINT using the minimum width.
pub fn write_vint<W: Write>(w: &mut W, value: u64) -> Result<usize> {
    write_vint_fixed(w, value, vint_size(value))
}

/// Write a data-size VINT using exactly `width` bytes.
///
/// Used to reserve space that is patched later (e.g. the 8-byte Segment
/// size). Fails if the value does not fit in `width` bytes.
pub fn write_vint_fixed<W: Write>(w: &mut W, value: u64, width: usize) -> Result<usize> {
    if width == 0 || width > MAX_VINT_WIDTH {
        return Err(MkvError::VintOverflow);
    }
    if value >= 1u64 << (7 * width) {
        return Err(MkvError::VintOverflow);
    }

    let mut bytes = [0u8; MAX_VINT_WIDTH];
    let mut v = value;
    for i in (0..width).rev() {
        bytes[i] = (v & 0xFF) as u8;
        v >>= 8;
    }
    // The marker bit sits at position (8 - width) of the first byte
    bytes[0] |= 1 << (8 - width);

    w.write_all(&bytes[..width])?;
    Ok(width)
}

/// Write an "unknown size" VINT of the given width.
///
/// The first byte is `0xFF >> (width - 1)`, the rest are `0xFF`.
pub fn write_unknown_size<W: Write>(w: &mut W, width: usize) -> Result<usize> {
    if width == 0 || width > MAX_VINT_WIDTH {
        return Err(MkvError::VintOverflow);
    }

    let mut bytes = [0xFFu8; MAX_VINT_WIDTH];
    bytes[0] = 0xFF >> (width - 1);
    w.write_all(&bytes[..width])?;
    Ok(width)
}

/// Number of bytes an element ID occupies, inferred from its magnitude.
///
/// IDs carry their own VINT marker, so anything below 0x80 is invalid.
pub fn id_size(id: u32) -> Result<usize> {
    if id < 0x80 {
        return Err(MkvError::InvalidElementId { id });
    }
    Ok(if id <= 0xFF {
        1
    } else if id <= 0xFFFF {
        2
    } else if id <= 0xFF_FFFF {
        3
    } else {
        4
    })
}

/// Write an element ID as its raw big-endian bytes.
pub fn write_id<W: Write>(w: &mut W, id: u32) -> Result<usize> {
    let len = id_size(id)?;
    let bytes = id.to_be_bytes();
    w.write_all(&bytes[4 - len..])?;
    Ok(len)
}

/// Minimum bytes for an unsigned big-endian payload (at least one).
fn uint_size(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    (8 - value.leading_zeros() as usize / 8).max(1)
}

/// Minimum bytes for a signed two's-complement payload.
fn sint_size(value: i64) -> usize {
    if (-128..=127).contains(&value) {
        1
    } else if (-32_768..=32_767).contains(&value) {
        2
    } else if (-8_388_608..=8_388_607).contains(&value) {
        3
    } else if (i64::from(i32::MIN)..=i64::from(i32::MAX)).contains(&value) {
        4
    } else {
        8
    }
}

/// Write an unsigned integer element: `<ID><size><big-endian value>`.
pub fn write_uint<W: Write>(w: &mut W, id: u32, value: u64) -> Result<usize> {
    let mut written = write_id(w, id)?;
    let val_size = uint_size(value);
    written += write_vint(w, val_size as u64)?;
    let bytes = value.to_be_bytes();
    w.write_all(&bytes[8 - val_size..])?;
    Ok(written + val_size)
}

/// Write a signed integer element in minimum-width two's complement.
pub fn write_sint<W: Write>(w: &mut W, id: u32, value: i64) -> Result<usize> {
    let mut written = write_id(w, id)?;
    let val_size = sint_size(value);
    written += write_vint(w, val_size as u64)?;
    let bytes = value.to_be_bytes();
    w.write_all(&bytes[8 - val_size..])?;
    Ok(written + val_size)
}

/// Write a float element, always as 8-byte IEEE-754 big-endian.
pub fn write_float<W: Write>(w: &mut W, id: u32, value: f64) -> Result<usize> {
    let mut written = write_id(w, id)?;
    written += write_vint(w, 8)?;
    w.write_f64::<BigEndian>(value)?;
    Ok(written + 8)
}

/// Write a UTF-8 string element.
pub fn write_string<W: Write>(w: &mut W, id: u32, value: &str) -> Result<usize> {
    write_binary(w, id, value.as_bytes())
}

/// Write a binary element.
pub fn write_binary<W: Write>(w: &mut W, id: u32, data: &[u8]) -> Result<usize> {
    let mut written = write_id(w, id)?;
    written += write_vint(w, data.len() as u64)?;
    w.write_all(data)?;
    Ok(written + data.len())
}

/// Open a master element: write its ID and content size only.
///
/// The caller must append exactly `content_size` bytes of content.
pub fn write_master_open<W: Write>(w: &mut W, id: u32, content_size: u64) -> Result<usize> {
    let mut written = write_id(w, id)?;
    written += write_vint(w, content_size)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vint_bytes(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_vint(&mut out, value).unwrap();
        out
    }

    #[test]
    fn test_vint_width_boundaries() {
        assert_eq!(vint_bytes(0), vec![0x80]);
        assert_eq!(vint_bytes(1), vec![0x81]);
        assert_eq!(vint_bytes(127), vec![0xFF]);
        assert_eq!(vint_bytes(128), vec![0x40, 0x80]);
        assert_eq!(vint_bytes(16383), vec![0x7F, 0xFF]);
        assert_eq!(vint_bytes(16384), vec![0x20, 0x40, 0x00]);
    }

    #[test]
    fn test_vint_size_is_minimal() {
        for (value, expected) in [
            (0u64, 1usize),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (0x1F_FFFF, 3),
            (0x20_0000, 4),
            (u64::from(u32::MAX), 5),
            ((1 << 56) - 1, 8),
        ] {
            assert_eq!(vint_size(value), expected, "value 0x{value:X}");
        }
    }

    #[test]
    fn test_vint_fixed_width() {
        let mut out = Vec::new();
        write_vint_fixed(&mut out, 100, 8).unwrap();
        assert_eq!(out, vec![0x01, 0, 0, 0, 0, 0, 0, 100]);

        let mut out = Vec::new();
        assert!(write_vint_fixed(&mut out, 1 << 14, 2).is_err());
        assert!(write_vint_fixed(&mut out, 0, 9).is_err());
    }

    #[test]
    fn test_unknown_size() {
        let mut out = Vec::new();
        write_unknown_size(&mut out, 1).unwrap();
        assert_eq!(out, vec![0xFF]);

        let mut out = Vec::new();
        write_unknown_size(&mut out, 2).unwrap();
        assert_eq!(out, vec![0x7F, 0xFF]);

        let mut out = Vec::new();
        write_unknown_size(&mut out, 8).unwrap();
        assert_eq!(out, vec![0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_id() {
        let mut out = Vec::new();
        write_id(&mut out, 0xA3).unwrap();
        assert_eq!(out, vec![0xA3]);

        let mut out = Vec::new();
        write_id(&mut out, 0x1A45DFA3).unwrap();
        assert_eq!(out, vec![0x1A, 0x45, 0xDF, 0xA3]);

        let mut out = Vec::new();
        assert!(write_id(&mut out, 0x7F).is_err());
    }

    #[test]
    fn test_write_uint_minimal_width() {
        let mut out = Vec::new();
        let n = write_uint(&mut out, 0xD7, 1).unwrap();
        assert_eq!(out, vec![0xD7, 0x81, 0x01]);
        assert_eq!(n, out.len());

        let mut out = Vec::new();
        write_uint(&mut out, 0x2AD7B1, 1_000_000).unwrap();
        assert_eq!(out, vec![0x2A, 0xD7, 0xB1, 0x83, 0x0F, 0x42, 0x40]);

        let mut out = Vec::new();
        write_uint(&mut out, 0xD7, 0).unwrap();
        assert_eq!(out, vec![0xD7, 0x81, 0x00]);
    }

    #[test]
    fn test_write_sint_widths() {
        let mut out = Vec::new();
        write_sint(&mut out, 0xFB, -1).unwrap();
        assert_eq!(out, vec![0xFB, 0x81, 0xFF]);

        let mut out = Vec::new();
        write_sint(&mut out, 0xFB, -129).unwrap();
        assert_eq!(out, vec![0xFB, 0x82, 0xFF, 0x7F]);
    }

    #[test]
    fn test_write_float_always_eight_bytes() {
        let mut out = Vec::new();
        let n = write_float(&mut out, 0x4489, 0.0).unwrap();
        assert_eq!(n, 2 + 1 + 8);
        assert_eq!(&out[..3], &[0x44, 0x89, 0x88]);
        assert_eq!(&out[3..], &0.0f64.to_be_bytes());
    }

    #[test]
    fn test_write_string_and_binary() {
        let mut out = Vec::new();
        write_string(&mut out, 0x4282, "matroska").unwrap();
        assert_eq!(&out[..2], &[0x42, 0x82]);
        assert_eq!(out[2], 0x88);
        assert_eq!(&out[3..], b"matroska");

        let mut out = Vec::new();
        let n = write_binary(&mut out, 0x63A2, &[1, 2, 3]).unwrap();
        assert_eq!(n, out.len());
    }

    #[test]
    fn test_master_open_then_content() {
        let mut out = Vec::new();
        let mut content = Vec::new();
        write_uint(&mut content, 0xE7, 42).unwrap();

        let header_len = write_master_open(&mut out, 0x1F43B675, content.len() as u64).unwrap();
        out.extend_from_slice(&content);
        assert_eq!(out.len(), header_len + content.len());
        assert_eq!(&out[..4], &[0x1F, 0x43, 0xB6, 0x75]);
    }
}
