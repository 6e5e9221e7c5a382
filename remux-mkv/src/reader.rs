//! The contract between elementary-stream readers and the muxer.
//!
//! Readers own the demuxing and header parsing; the muxer borrows them for
//! one session and pulls codec parameters from them at header-commit time.

use crate::elements::codec_ids;
use remux_av1::SequenceHeader;

/// Matroska track types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrackType {
    /// Video track.
    Video = 1,
    /// Audio track.
    Audio = 2,
    /// Subtitle track.
    Subtitle = 17,
}

/// Internal codec tags for the supported elementary streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecTag {
    /// H.264 / AVC video.
    H264,
    /// H.265 / HEVC video.
    Hevc,
    /// H.266 / VVC video.
    Vvc,
    /// AV1 video.
    Av1,
    /// MPEG-2 video.
    Mpeg2,
    /// VfW-compatible FourCC video (e.g. VC-1).
    VfwFourcc,
    /// AC-3 audio.
    Ac3,
    /// E-AC-3 audio.
    Eac3,
    /// TrueHD audio.
    TrueHd,
    /// MLP audio.
    Mlp,
    /// AAC audio.
    Aac,
    /// DTS audio.
    Dts,
    /// LPCM audio.
    Lpcm,
    /// MP3 audio.
    Mp3,
    /// UTF-8 text subtitles.
    SrtText,
    /// HDMV presentation graphics subtitles.
    Pgs,
}

impl CodecTag {
    /// The Matroska codec ID string for this codec.
    pub fn matroska_codec_id(&self) -> &'static str {
        match self {
            Self::H264 => codec_ids::V_MPEG4_ISO_AVC,
            Self::Hevc => codec_ids::V_MPEGH_ISO_HEVC,
            Self::Vvc => codec_ids::V_MPEGI_ISO_VVC,
            Self::Av1 => codec_ids::V_AV1,
            Self::Mpeg2 => codec_ids::V_MPEG2,
            Self::VfwFourcc => codec_ids::V_MS_VFW_FOURCC,
            Self::Ac3 => codec_ids::A_AC3,
            Self::Eac3 => codec_ids::A_EAC3,
            Self::TrueHd | Self::Mlp => codec_ids::A_TRUEHD,
            Self::Aac => codec_ids::A_AAC,
            Self::Dts => codec_ids::A_DTS,
            Self::Lpcm => codec_ids::A_PCM_INT_LIT,
            Self::Mp3 => codec_ids::A_MPEG_L3,
            Self::SrtText => codec_ids::S_TEXT_UTF8,
            Self::Pgs => codec_ids::S_HDMV_PGS,
        }
    }

    /// The Matroska track type for this codec.
    pub fn track_type(&self) -> TrackType {
        match self {
            Self::H264 | Self::Hevc | Self::Vvc | Self::Av1 | Self::Mpeg2 | Self::VfwFourcc => {
                TrackType::Video
            }
            Self::Ac3
            | Self::Eac3
            | Self::TrueHd
            | Self::Mlp
            | Self::Aac
            | Self::Dts
            | Self::Lpcm
            | Self::Mp3 => TrackType::Audio,
            Self::SrtText | Self::Pgs => TrackType::Subtitle,
        }
    }

    /// Whether frame payloads need a byte-level reformat for Matroska.
    ///
    /// AV1 converts from the start-code framing to the low-overhead format;
    /// H.26x converts from Annex-B to 4-byte length prefixes. Everything
    /// else passes through untouched.
    pub fn needs_reformat(&self) -> bool {
        matches!(self, Self::Av1 | Self::H264 | Self::Hevc | Self::Vvc)
    }
}

/// Display aspect ratio tag carried by a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    /// Keep the stream default (square pixels).
    #[default]
    KeepDefault,
    /// VGA (already square).
    Vga,
    /// 4:3 display.
    Ratio4x3,
    /// 16:9 display.
    Ratio16x9,
    /// 2.21:1 display.
    Ratio221x100,
}

/// Video metrics exposed by a reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetrics {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Frames per second; 0.0 when unknown.
    pub fps: f64,
    /// Interlaced content flag.
    pub interlaced: bool,
    /// Display aspect ratio tag.
    pub aspect_ratio: AspectRatio,
}

/// Audio metrics exposed by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioMetrics {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u32,
    /// Bits per sample, when the codec exposes it (LPCM).
    pub bit_depth: Option<u32>,
}

/// HEVC parameter sets plus the SPS fields the configuration record needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HevcParameterSets {
    /// Serialized VPS NAL unit.
    pub vps: Vec<u8>,
    /// Serialized SPS NAL unit.
    pub sps: Vec<u8>,
    /// Serialized PPS NAL unit, if parsed.
    pub pps: Option<Vec<u8>>,
    /// general_profile_idc.
    pub profile_idc: u8,
    /// general_level_idc.
    pub level_idc: u8,
    /// chroma_format_idc.
    pub chroma_format: u8,
    /// bit_depth_luma_minus8.
    pub bit_depth_luma_minus8: u8,
    /// bit_depth_chroma_minus8.
    pub bit_depth_chroma_minus8: u8,
}

/// A snapshot of the parsed parameter-set state of a reader.
///
/// The variant carries exactly what the corresponding CodecPrivate builder
/// needs; codecs without CodecPrivate use `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSets {
    /// No parameter sets (AC-3, DTS, TrueHD, MLP, LPCM, MP3, SRT, PGS...).
    None,
    /// H.264 SPS and PPS NAL units in parameter-set-id order.
    Avc {
        /// Serialized SPS NAL units.
        sps: Vec<Vec<u8>>,
        /// Serialized PPS NAL units.
        pps: Vec<Vec<u8>>,
    },
    /// HEVC VPS/SPS/PPS with the SPS-derived record fields.
    Hevc(HevcParameterSets),
    /// VVC raw parameter-set buffers.
    Vvc {
        /// Serialized VPS NAL unit.
        vps: Vec<u8>,
        /// Serialized SPS NAL unit.
        sps: Vec<u8>,
        /// Serialized PPS NAL unit.
        pps: Vec<u8>,
    },
    /// AV1 sequence header, when one has been parsed.
    Av1(Option<SequenceHeader>),
    /// AAC AudioSpecificConfig inputs.
    Aac {
        /// AAC profile (0-based; object type is profile + 1).
        profile: u8,
        /// Sampling-frequency index.
        sample_rate_index: u8,
        /// Channel configuration index.
        channel_config: u8,
    },
}

/// The reader interface the muxer consumes.
///
/// All methods are read-only snapshots; the muxer calls them when the
/// deferred header is committed, after every track has delivered at least
/// one packet (so the readers have parsed their headers).
pub trait CodecReader {
    /// The codec carried by this stream.
    fn codec(&self) -> CodecTag;

    /// Current video metrics, for video streams.
    fn video_metrics(&self) -> Option<VideoMetrics> {
        None
    }

    /// Current audio metrics, for audio streams.
    fn audio_metrics(&self) -> Option<AudioMetrics> {
        None
    }

    /// Snapshot of the parsed parameter sets.
    fn parameter_sets(&self) -> ParameterSets {
        ParameterSets::None
    }
}
