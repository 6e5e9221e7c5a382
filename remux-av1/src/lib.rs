//! # remux-av1
//!
//! AV1 bitstream support for Matroska muxing.
//!
//! This crate parses just enough of the AV1 syntax to drive a container
//! muxer:
//! - Open Bitstream Unit (OBU) headers and LEB128 size fields
//! - The sequence header, including `color_config`, for resolution, frame
//!   rate, bit depth and the `AV1CodecConfigurationRecord`
//! - The uncompressed frame header prefix, for keyframe detection
//! - A stream probe that recognizes AV1 elementary data in the internal
//!   start-code framing
//!
//! Payload data is never re-encoded; only the framing around OBUs changes
//! between the start-code representation and the low-overhead format.

pub mod error;
pub mod frame;
pub mod obu;
pub mod probe;
pub mod sequence;

pub use error::{Av1Error, Result};
pub use frame::{FrameHeader, FrameType};
pub use obu::{decode_leb128, encode_leb128, extract_config_obus, ObuHeader, ObuType};
pub use probe::{probe_stream, StreamInfo};
pub use sequence::{DynamicRange, SequenceHeader};
