//! # remux-mkv
//!
//! A Matroska/EBML muxer for pre-encoded elementary bitstreams.
//!
//! The muxer assembles AV1, H.264/HEVC/VVC and MPEG-2 video, a range of
//! audio codecs (AAC, AC-3, E-AC-3, DTS, TrueHD/MLP, LPCM, MP3) and
//! UTF-8/PGS subtitles into a single `.mkv` file. Payloads pass through
//! unmodified except where the container mandates a byte-level reformat:
//! AV1 is converted from the internal start-code framing to the
//! low-overhead bitstream format, H.26x from Annex-B to 4-byte length
//! prefixes.
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufWriter;
//! use remux_core::{Packet, PacketFlags};
//! use remux_mkv::MkvMuxer;
//! # struct MyAv1Reader;
//! # impl remux_mkv::CodecReader for MyAv1Reader {
//! #     fn codec(&self) -> remux_mkv::CodecTag { remux_mkv::CodecTag::Av1 }
//! # }
//!
//! let reader = MyAv1Reader; // implements CodecReader
//! let file = BufWriter::new(File::create("output.mkv").unwrap());
//!
//! let mut muxer = MkvMuxer::new(file);
//! muxer.add_track(0, &reader).unwrap();
//! muxer.open().unwrap();
//!
//! // Feed packets from the demuxer...
//! let packet = Packet::new(vec![]).with_flags(PacketFlags::KEYFRAME);
//! muxer.write_packet(&packet).unwrap();
//!
//! muxer.finalize().unwrap();
//! ```
//!
//! ## Output layout
//!
//! ```text
//! EBML Header
//! Segment (8-byte size, patched at finalize)
//! ├── Info (TimecodeScale, Duration placeholder, app strings)
//! ├── Tracks
//! ├── Cluster*  (each buffered in memory, written with a known size)
//! ├── Cues      (one entry per video keyframe)
//! └── SeekHead  (Info, Tracks, Cues)
//! ```
//!
//! SegmentInfo and Tracks are deferred until every registered track has
//! delivered at least one packet, so codec readers have parsed their
//! headers by the time track properties are committed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec_private;
pub mod ebml;
pub mod elements;
pub mod error;
pub mod muxer;
pub mod reader;
pub mod reformat;

pub use error::{MkvError, Result};
pub use muxer::MkvMuxer;
pub use reader::{
    AspectRatio, AudioMetrics, CodecReader, CodecTag, HevcParameterSets, ParameterSets, TrackType,
    VideoMetrics,
};
pub use reformat::{annex_b_to_length_prefixed, av1_to_low_overhead, reformat_frame};
