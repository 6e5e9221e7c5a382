//! Frame payload reformatting.
//!
//! Elementary readers hand frames over in start-code framing. Matroska
//! requires the low-overhead bitstream format for AV1 and 4-byte length
//! prefixes for H.26x, so completed frames pass through one of the two
//! converters here. Both are total: malformed units are dropped, never
//! propagated as errors.

use crate::reader::CodecTag;
use remux_av1::{encode_leb128, ObuHeader, ObuType};
use remux_core::bitstream::{find_start_code, remove_emulation_prevention};

/// Apply the container-mandated reformat for `codec`, if it requires one.
///
/// Gated on [`CodecTag::needs_reformat`]: AV1 goes through the
/// low-overhead conversion, the other reformatted codecs through the
/// Annex-B length-prefix conversion. Returns `None` for codecs whose
/// payloads pass through untouched.
pub fn reformat_frame(codec: CodecTag, data: &[u8]) -> Option<Vec<u8>> {
    if !codec.needs_reformat() {
        return None;
    }
    Some(match codec {
        CodecTag::Av1 => av1_to_low_overhead(data),
        _ => annex_b_to_length_prefixed(data),
    })
}

/// One OBU converted to its low-overhead encoding.
struct ConvertedObu {
    obu_type: ObuType,
    bytes: Vec<u8>,
}

/// Convert start-code-framed AV1 OBUs to the low-overhead bitstream format.
///
/// Per AV1-in-Matroska:
/// - every OBU gets `obu_has_size_field=1` and a LEB128 payload size,
///   with emulation prevention bytes removed from the payload;
/// - temporal-delimiter OBUs are dropped;
/// - of several sequence headers before the first FRAME/FRAME_HEADER only
///   the last survives (the in-band one is authoritative when a copy from
///   the parser precedes it).
pub fn av1_to_low_overhead(data: &[u8]) -> Vec<u8> {
    let mut obus: Vec<ConvertedObu> = Vec::with_capacity(16);

    let mut pos = match find_start_code(data) {
        Some((offset, len)) => offset + len,
        None => return Vec::new(),
    };

    while pos < data.len() {
        let (payload_end, next) = unit_bounds(data, pos, true);

        match ObuHeader::parse(&data[pos..payload_end]) {
            Ok((hdr, hdr_len)) => {
                if hdr.obu_type == ObuType::TemporalDelimiter {
                    pos = next;
                    continue;
                }

                let payload = &data[pos + hdr_len..payload_end];
                let raw = remove_emulation_prevention(payload);

                let mut bytes = Vec::with_capacity(raw.len() + hdr_len + 2);
                bytes.push(data[pos] | 0x02); // set obu_has_size_field
                if hdr.extension_flag {
                    bytes.push(data[pos + 1]);
                }
                bytes.extend(encode_leb128(raw.len() as u64));
                bytes.extend_from_slice(&raw);

                obus.push(ConvertedObu {
                    obu_type: hdr.obu_type,
                    bytes,
                });
            }
            Err(err) => {
                tracing::debug!(offset = pos, %err, "skipping malformed OBU");
            }
        }

        pos = next;
    }

    // Among sequence headers preceding the first frame, keep only the last
    let first_frame_idx = obus
        .iter()
        .position(|obu| obu.obu_type.starts_frame())
        .unwrap_or(obus.len());
    let last_sh_before_frame = obus[..first_frame_idx]
        .iter()
        .rposition(|obu| obu.obu_type == ObuType::SequenceHeader);

    let mut result = Vec::with_capacity(data.len());
    for (i, obu) in obus.iter().enumerate() {
        if obu.obu_type == ObuType::SequenceHeader
            && i < first_frame_idx
            && Some(i) != last_sh_before_frame
        {
            continue;
        }
        result.extend_from_slice(&obu.bytes);
    }

    result
}

/// Convert Annex-B start-code-framed NAL units to 4-byte length prefixes.
pub fn annex_b_to_length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    let mut pos = match find_start_code(data) {
        Some((offset, len)) => offset + len,
        None => return result,
    };

    while pos < data.len() {
        let (unit_end, next) = unit_bounds(data, pos, false);

        let unit = &data[pos..unit_end];
        if !unit.is_empty() {
            result.extend_from_slice(&(unit.len() as u32).to_be_bytes());
            result.extend_from_slice(unit);
        }

        pos = next;
    }

    result
}

/// Bounds of the unit starting at `pos`: the payload end (next start code
/// minus its trailing zeros) and the position just past the next start code.
///
/// `trim_at_end` controls whether trailing zeros are also shed when the
/// unit runs to the end of the buffer (the AV1 path does, Annex-B keeps
/// them as payload).
fn unit_bounds(data: &[u8], pos: usize, trim_at_end: bool) -> (usize, usize) {
    match find_start_code(&data[pos..]) {
        Some((offset, len)) => {
            let mut end = pos + offset;
            while end > pos && data[end - 1] == 0 {
                end -= 1;
            }
            (end, pos + offset + len)
        }
        None => {
            let mut end = data.len();
            if trim_at_end {
                while end > pos && data[end - 1] == 0 {
                    end -= 1;
                }
            }
            (end, data.len())
        }
    }
}
