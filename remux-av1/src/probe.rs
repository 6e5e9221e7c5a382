//! AV1 elementary-stream detection.
//!
//! Scans a start-code-framed buffer for a parseable sequence header plus a
//! frame OBU. Requiring both keeps random data from other codecs (whose
//! start codes can look like OBU headers) from being misdetected.
//!
//! The probe keeps no state: it is a pure function over the candidate
//! buffer, so repeated probing cannot disturb timing counters elsewhere.

use crate::obu::{ObuHeader, ObuType};
use crate::sequence::SequenceHeader;
use remux_core::bitstream::find_start_code;

/// Result of a successful stream probe.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// The parsed sequence header.
    pub sequence_header: SequenceHeader,
    /// Human-readable stream description.
    pub description: String,
}

/// Probe a buffer of start-code-framed data for an AV1 stream.
///
/// Returns `None` unless both a valid sequence header and a
/// FRAME/FRAME_HEADER OBU are found.
pub fn probe_stream(data: &[u8]) -> Option<StreamInfo> {
    let mut seq: Option<SequenceHeader> = None;
    let mut found_frame = false;

    let mut pos = match find_start_code(data) {
        Some((offset, len)) => offset + len,
        None => return None,
    };

    while pos < data.len() {
        let (end, next) = match find_start_code(&data[pos..]) {
            Some((offset, len)) => {
                // Trailing zeros belong to the next start-code prefix
                let mut end = pos + offset;
                while end > pos && data[end - 1] == 0 {
                    end -= 1;
                }
                (end, pos + offset + len)
            }
            None => (data.len(), data.len()),
        };

        if let Ok((hdr, hdr_len)) = ObuHeader::parse(&data[pos..end]) {
            match hdr.obu_type {
                ObuType::SequenceHeader if seq.is_none() => {
                    let payload = &data[pos + hdr_len..end];
                    if let Ok(parsed) = SequenceHeader::parse(payload) {
                        let aspect =
                            f64::from(parsed.max_frame_width) / f64::from(parsed.max_frame_height);
                        if (0.1..=20.0).contains(&aspect) {
                            seq = Some(parsed);
                        }
                    }
                }
                ObuType::Frame | ObuType::FrameHeader => found_frame = true,
                _ => {}
            }
        }

        if found_frame {
            if let Some(sequence_header) = seq.take() {
                let description = describe(&sequence_header);
                tracing::debug!(%description, "detected AV1 stream");
                return Some(StreamInfo {
                    sequence_header,
                    description,
                });
            }
        }

        pos = next;
    }

    None
}

fn describe(seq: &SequenceHeader) -> String {
    let fps = seq.fps();
    let fps_text = if fps > 0.0 {
        format!("{fps}")
    } else {
        "not found".to_string()
    };
    format!(
        "Profile: {}  Level: {}  Resolution: {}x{}  Bit depth: {}bit  Frame rate: {}",
        seq.seq_profile,
        seq.seq_level_idx_0,
        seq.max_frame_width,
        seq.max_frame_height,
        seq.bit_depth(),
        fps_text
    )
}
