//! Matroska element IDs and codec ID strings.
//!
//! Only the elements this muxer writes are listed.

// =============================================================================
// EBML Header Elements
// =============================================================================

/// EBML Header element.
pub const EBML: u32 = 0x1A45DFA3;
/// EBML Version.
pub const EBML_VERSION: u32 = 0x4286;
/// EBML Read Version.
pub const EBML_READ_VERSION: u32 = 0x42F7;
/// EBML Max ID Length.
pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
/// EBML Max Size Length.
pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
/// EBML Doc Type.
pub const DOC_TYPE: u32 = 0x4282;
/// EBML Doc Type Version.
pub const DOC_TYPE_VERSION: u32 = 0x4287;
/// EBML Doc Type Read Version.
pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

// =============================================================================
// Segment
// =============================================================================

/// Segment (the root container for all Matroska data).
pub const SEGMENT: u32 = 0x18538067;

// =============================================================================
// Meta Seek Information
// =============================================================================

/// SeekHead (index of top-level elements).
pub const SEEK_HEAD: u32 = 0x114D9B74;
/// Seek entry.
pub const SEEK: u32 = 0x4DBB;
/// Seek ID.
pub const SEEK_ID: u32 = 0x53AB;
/// Seek Position.
pub const SEEK_POSITION: u32 = 0x53AC;

// =============================================================================
// Segment Information
// =============================================================================

/// Segment Info.
pub const INFO: u32 = 0x1549A966;
/// Timecode Scale (nanoseconds per timecode unit).
pub const TIMECODE_SCALE: u32 = 0x2AD7B1;
/// Duration (in timecode units, float).
pub const DURATION: u32 = 0x4489;
/// Muxing App.
pub const MUXING_APP: u32 = 0x4D80;
/// Writing App.
pub const WRITING_APP: u32 = 0x5741;

// =============================================================================
// Tracks
// =============================================================================

/// Tracks.
pub const TRACKS: u32 = 0x1654AE6B;
/// Track Entry.
pub const TRACK_ENTRY: u32 = 0xAE;
/// Track Number.
pub const TRACK_NUMBER: u32 = 0xD7;
/// Track UID.
pub const TRACK_UID: u32 = 0x73C5;
/// Track Type (1=video, 2=audio, 17=subtitle).
pub const TRACK_TYPE: u32 = 0x83;
/// Flag Lacing.
pub const FLAG_LACING: u32 = 0x9C;
/// Codec ID.
pub const CODEC_ID: u32 = 0x86;
/// Codec Private.
pub const CODEC_PRIVATE: u32 = 0x63A2;
/// Default Duration (nanoseconds per frame).
pub const DEFAULT_DURATION: u32 = 0x23E383;
/// Video settings master.
pub const VIDEO: u32 = 0xE0;
/// Pixel Width.
pub const PIXEL_WIDTH: u32 = 0xB0;
/// Pixel Height.
pub const PIXEL_HEIGHT: u32 = 0xBA;
/// Display Width.
pub const DISPLAY_WIDTH: u32 = 0x54B0;
/// Display Height.
pub const DISPLAY_HEIGHT: u32 = 0x54BA;
/// Flag Interlaced.
pub const FLAG_INTERLACED: u32 = 0x9A;
/// Audio settings master.
pub const AUDIO: u32 = 0xE1;
/// Sampling Frequency (float).
pub const SAMPLING_FREQUENCY: u32 = 0xB5;
/// Channels.
pub const CHANNELS: u32 = 0x9F;
/// Bit Depth.
pub const BIT_DEPTH: u32 = 0x6264;

// =============================================================================
// Cluster
// =============================================================================

/// Cluster (contains blocks of media data).
pub const CLUSTER: u32 = 0x1F43B675;
/// Cluster Timecode.
pub const TIMECODE: u32 = 0xE7;
/// SimpleBlock.
pub const SIMPLE_BLOCK: u32 = 0xA3;

// =============================================================================
// Cues
// =============================================================================

/// Cues (seeking index).
pub const CUES: u32 = 0x1C53BB6B;
/// Cue Point.
pub const CUE_POINT: u32 = 0xBB;
/// Cue Time.
pub const CUE_TIME: u32 = 0xB3;
/// Cue Track Positions.
pub const CUE_TRACK_POSITIONS: u32 = 0xB7;
/// Cue Track.
pub const CUE_TRACK: u32 = 0xF7;
/// Cue Cluster Position.
pub const CUE_CLUSTER_POSITION: u32 = 0xF1;

// =============================================================================
// Document type
// =============================================================================

/// DocType string written in the EBML header.
pub const DOC_TYPE_MATROSKA: &str = "matroska";
/// DocTypeVersion written in the EBML header.
pub const DOC_TYPE_VERSION_VALUE: u64 = 4;
/// DocTypeReadVersion written in the EBML header.
pub const DOC_TYPE_READ_VERSION_VALUE: u64 = 2;

/// Matroska codec ID strings.
pub mod codec_ids {
    /// H.264 / AVC.
    pub const V_MPEG4_ISO_AVC: &str = "V_MPEG4/ISO/AVC";
    /// H.265 / HEVC.
    pub const V_MPEGH_ISO_HEVC: &str = "V_MPEGH/ISO/HEVC";
    /// H.266 / VVC.
    pub const V_MPEGI_ISO_VVC: &str = "V_MPEGI/ISO/VVC";
    /// AV1.
    pub const V_AV1: &str = "V_AV1";
    /// MPEG-2 video.
    pub const V_MPEG2: &str = "V_MPEG2";
    /// VfW-compatible FourCC video (e.g. VC-1).
    pub const V_MS_VFW_FOURCC: &str = "V_MS/VFW/FOURCC";
    /// AC-3.
    pub const A_AC3: &str = "A_AC3";
    /// E-AC-3.
    pub const A_EAC3: &str = "A_EAC3";
    /// TrueHD (also used for MLP).
    pub const A_TRUEHD: &str = "A_TRUEHD";
    /// AAC.
    pub const A_AAC: &str = "A_AAC";
    /// DTS.
    pub const A_DTS: &str = "A_DTS";
    /// Little-endian integer PCM.
    pub const A_PCM_INT_LIT: &str = "A_PCM/INT/LIT";
    /// MPEG Layer 3.
    pub const A_MPEG_L3: &str = "A_MPEG/L3";
    /// UTF-8 text subtitles.
    pub const S_TEXT_UTF8: &str = "S_TEXT/UTF8";
    /// HDMV presentation graphics subtitles.
    pub const S_HDMV_PGS: &str = "S_HDMV/PGS";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_ids_are_four_bytes() {
        for id in [EBML, SEGMENT, SEEK_HEAD, INFO, TRACKS, CLUSTER, CUES] {
            assert!(id > 0xFF_FFFF, "0x{id:08X} should be a 4-byte ID");
        }
    }

    #[test]
    fn test_known_id_values() {
        assert_eq!(EBML, 0x1A45DFA3);
        assert_eq!(SEGMENT, 0x18538067);
        assert_eq!(SIMPLE_BLOCK, 0xA3);
        assert_eq!(TIMECODE, 0xE7);
        assert_eq!(CUE_CLUSTER_POSITION, 0xF1);
    }
}
