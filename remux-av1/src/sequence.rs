//! AV1 sequence header parsing.
//!
//! Parses the subset of `sequence_header_obu()` a container needs: profile,
//! level/tier of operating point 0, timing info, maximum frame size and the
//! color configuration. Everything else is skipped bit-accurately.

use crate::error::{Av1Error, Result};
use remux_core::bitstream::{remove_emulation_prevention, BitReader};

/// Color primaries: BT.709.
pub const CP_BT_709: u8 = 1;
/// Color primaries: unspecified.
pub const CP_UNSPECIFIED: u8 = 2;
/// Color primaries: BT.601.
pub const CP_BT_601: u8 = 6;
/// Color primaries: BT.2020.
pub const CP_BT_2020: u8 = 9;

/// Transfer characteristics: sRGB.
pub const TC_SRGB: u8 = 13;
/// Transfer characteristics: PQ (SMPTE 2084).
pub const TC_PQ: u8 = 16;
/// Transfer characteristics: HLG.
pub const TC_HLG: u8 = 18;

/// Matrix coefficients: identity.
pub const MC_IDENTITY: u8 = 0;

/// Dynamic-range classification derived from the color descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicRange {
    /// Standard dynamic range (BT.709 or BT.601).
    Sdr,
    /// Wide color gamut without an HDR transfer (BT.2020 primaries).
    WideGamut,
    /// High dynamic range (PQ or HLG transfer).
    Hdr,
    /// No indication from the bitstream.
    Unspecified,
}

/// A parsed AV1 sequence header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    /// seq_profile, 0..=2.
    pub seq_profile: u8,
    /// Still-picture flag.
    pub still_picture: bool,
    /// Reduced still-picture header flag.
    pub reduced_still_picture_header: bool,
    /// seq_level_idx for operating point 0.
    pub seq_level_idx_0: u8,
    /// seq_tier for operating point 0.
    pub seq_tier_0: u8,

    /// Whether timing info was present.
    pub timing_info_present: bool,
    /// num_units_in_display_tick.
    pub num_units_in_display_tick: u32,
    /// time_scale.
    pub time_scale: u32,
    /// equal_picture_interval flag.
    pub equal_picture_interval: bool,
    /// num_ticks_per_picture_minus_1 (0 when not equal-interval).
    pub num_ticks_per_picture_minus_1: u32,

    /// Maximum frame width in pixels (16..=65536).
    pub max_frame_width: u32,
    /// Maximum frame height in pixels (16..=65536).
    pub max_frame_height: u32,

    /// high_bitdepth flag.
    pub high_bitdepth: bool,
    /// twelve_bit flag (profile 2 only).
    pub twelve_bit: bool,
    /// mono_chrome flag.
    pub mono_chrome: bool,
    /// Color primaries (default 2 = unspecified).
    pub color_primaries: u8,
    /// Transfer characteristics (default 2 = unspecified).
    pub transfer_characteristics: u8,
    /// Matrix coefficients (default 2 = unspecified).
    pub matrix_coefficients: u8,
    /// Full color range flag.
    pub color_range: bool,
    /// Chroma subsampling in x (0 or 1).
    pub chroma_subsampling_x: u8,
    /// Chroma subsampling in y (0 or 1).
    pub chroma_subsampling_y: u8,
    /// Chroma sample position (2 bits).
    pub chroma_sample_position: u8,
    /// separate_uv_delta_q flag.
    pub separate_uv_delta_q: bool,

    /// frame_id_numbers_present_flag.
    pub frame_id_numbers_present: bool,
}

impl Default for SequenceHeader {
    fn default() -> Self {
        Self {
            seq_profile: 0,
            still_picture: false,
            reduced_still_picture_header: false,
            seq_level_idx_0: 0,
            seq_tier_0: 0,
            timing_info_present: false,
            num_units_in_display_tick: 0,
            time_scale: 0,
            equal_picture_interval: false,
            num_ticks_per_picture_minus_1: 0,
            max_frame_width: 0,
            max_frame_height: 0,
            high_bitdepth: false,
            twelve_bit: false,
            mono_chrome: false,
            color_primaries: CP_UNSPECIFIED,
            transfer_characteristics: CP_UNSPECIFIED,
            matrix_coefficients: CP_UNSPECIFIED,
            color_range: false,
            chroma_subsampling_x: 0,
            chroma_subsampling_y: 0,
            chroma_sample_position: 0,
            separate_uv_delta_q: false,
            frame_id_numbers_present: false,
        }
    }
}

impl SequenceHeader {
    /// Parse a sequence header OBU payload (start-code framing, emulation
    /// prevention bytes still present).
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 3 {
            return Err(Av1Error::InvalidSequenceHeader("truncated".into()));
        }

        let data = remove_emulation_prevention(payload);
        let mut r = BitReader::new(&data);
        let mut hdr = Self::default();

        hdr.seq_profile = r.read_bits(3)? as u8;
        if hdr.seq_profile > 2 {
            return Err(Av1Error::InvalidSequenceHeader(format!(
                "profile {}",
                hdr.seq_profile
            )));
        }

        hdr.still_picture = r.read_bit()?;
        hdr.reduced_still_picture_header = r.read_bit()?;

        if hdr.reduced_still_picture_header {
            hdr.timing_info_present = false;
            hdr.seq_level_idx_0 = r.read_bits(5)? as u8;
            hdr.seq_tier_0 = 0;
        } else {
            hdr.timing_info_present = r.read_bit()?;
            let mut decoder_model_info_present = false;
            if hdr.timing_info_present {
                hdr.parse_timing_info(&mut r)?;
                decoder_model_info_present = r.read_bit()?;
                if decoder_model_info_present {
                    // decoder_model_info(): only the field widths matter downstream,
                    // and we need none of them
                    r.skip(5)?; // buffer_delay_length_minus_1
                    r.skip(32)?; // num_units_in_decoding_tick
                    r.skip(5)?; // buffer_removal_time_length_minus_1
                    r.skip(5)?; // frame_presentation_time_length_minus_1
                }
            }

            let initial_display_delay_present = r.read_bit()?;
            let operating_points_cnt_minus_1 = r.read_bits(5)?;

            for i in 0..=operating_points_cnt_minus_1 {
                r.skip(12)?; // operating_point_idc[i]
                let level = r.read_bits(5)? as u8;
                let tier = if level > 7 { r.read_bit()? as u8 } else { 0 };
                if i == 0 {
                    hdr.seq_level_idx_0 = level;
                    hdr.seq_tier_0 = tier;
                }
                if decoder_model_info_present && r.read_bit()? {
                    // operating_parameters_info(): coarse skip, nothing here is
                    // needed for stream info
                    r.skip(6)?;
                    r.skip(10)?;
                }
                if initial_display_delay_present && r.read_bit()? {
                    r.skip(4)?; // initial_display_delay_minus_1
                }
            }
        }

        let frame_width_bits = r.read_bits(4)? as u8 + 1;
        let frame_height_bits = r.read_bits(4)? as u8 + 1;
        hdr.max_frame_width = r.read_bits(frame_width_bits)? + 1;
        hdr.max_frame_height = r.read_bits(frame_height_bits)? + 1;

        // Minimum 16x16 rejects random byte patterns, 65536 is the spec maximum
        if hdr.max_frame_width < 16
            || hdr.max_frame_height < 16
            || hdr.max_frame_width > 65536
            || hdr.max_frame_height > 65536
        {
            return Err(Av1Error::InvalidSequenceHeader(format!(
                "frame size {}x{}",
                hdr.max_frame_width, hdr.max_frame_height
            )));
        }

        hdr.frame_id_numbers_present = if hdr.reduced_still_picture_header {
            false
        } else {
            r.read_bit()?
        };
        if hdr.frame_id_numbers_present {
            r.skip(4)?; // delta_frame_id_length_minus_2
            r.skip(3)?; // additional_frame_id_length_minus_1
        }

        r.skip(1)?; // use_128x128_superblock
        r.skip(1)?; // enable_filter_intra
        r.skip(1)?; // enable_intra_edge_filter

        if !hdr.reduced_still_picture_header {
            r.skip(1)?; // enable_interintra_compound
            r.skip(1)?; // enable_masked_compound
            r.skip(1)?; // enable_warped_motion
            r.skip(1)?; // enable_dual_filter
            let enable_order_hint = r.read_bit()?;
            if enable_order_hint {
                r.skip(1)?; // enable_jnt_comp
                r.skip(1)?; // enable_ref_frame_mvs
            }

            if !r.read_bit()? {
                r.skip(1)?; // seq_force_screen_content_tools
            }
            if !r.read_bit()? {
                r.skip(1)?; // seq_force_integer_mv
            }
            if enable_order_hint {
                r.skip(3)?; // order_hint_bits_minus_1
            }
        }

        r.skip(1)?; // enable_superres
        r.skip(1)?; // enable_cdef
        r.skip(1)?; // enable_restoration

        hdr.parse_color_config(&mut r)?;

        r.skip(1)?; // film_grain_params_present

        Ok(hdr)
    }

    /// timing_info() per AV1 spec Section 5.5.3.
    fn parse_timing_info(&mut self, r: &mut BitReader) -> Result<()> {
        self.num_units_in_display_tick = r.read_bits(32)?;
        self.time_scale = r.read_bits(32)?;
        self.equal_picture_interval = r.read_bit()?;
        self.num_ticks_per_picture_minus_1 = if self.equal_picture_interval {
            r.read_uvlc()?
        } else {
            0
        };
        Ok(())
    }

    /// color_config() per AV1 spec Section 5.5.2.
    fn parse_color_config(&mut self, r: &mut BitReader) -> Result<()> {
        self.high_bitdepth = r.read_bit()?;
        self.twelve_bit = if self.seq_profile == 2 && self.high_bitdepth {
            r.read_bit()?
        } else {
            false
        };

        self.mono_chrome = if self.seq_profile == 1 {
            false
        } else {
            r.read_bit()?
        };

        if r.read_bit()? {
            // color_description_present_flag
            self.color_primaries = r.read_bits(8)? as u8;
            self.transfer_characteristics = r.read_bits(8)? as u8;
            self.matrix_coefficients = r.read_bits(8)? as u8;
        } else {
            self.color_primaries = CP_UNSPECIFIED;
            self.transfer_characteristics = CP_UNSPECIFIED;
            self.matrix_coefficients = CP_UNSPECIFIED;
        }

        if self.mono_chrome {
            self.color_range = r.read_bit()?;
            self.chroma_subsampling_x = 1;
            self.chroma_subsampling_y = 1;
            self.chroma_sample_position = 0;
            self.separate_uv_delta_q = false;
            return Ok(());
        }

        if self.color_primaries == CP_BT_709
            && self.transfer_characteristics == TC_SRGB
            && self.matrix_coefficients == MC_IDENTITY
        {
            // sRGB special case: full range, 4:4:4
            self.color_range = true;
            self.chroma_subsampling_x = 0;
            self.chroma_subsampling_y = 0;
        } else {
            self.color_range = r.read_bit()?;
            match self.seq_profile {
                0 => {
                    self.chroma_subsampling_x = 1;
                    self.chroma_subsampling_y = 1;
                }
                1 => {
                    self.chroma_subsampling_x = 0;
                    self.chroma_subsampling_y = 0;
                }
                _ => {
                    if self.bit_depth() == 12 {
                        self.chroma_subsampling_x = r.read_bit()? as u8;
                        self.chroma_subsampling_y = if self.chroma_subsampling_x == 1 {
                            r.read_bit()? as u8
                        } else {
                            0
                        };
                    } else {
                        self.chroma_subsampling_x = 1;
                        self.chroma_subsampling_y = 0;
                    }
                }
            }
            if self.chroma_subsampling_x == 1 && self.chroma_subsampling_y == 1 {
                self.chroma_sample_position = r.read_bits(2)? as u8;
            }
        }

        self.separate_uv_delta_q = r.read_bit()?;
        Ok(())
    }

    /// Coded bit depth: 8, 10 or 12.
    pub fn bit_depth(&self) -> u8 {
        if self.seq_profile == 2 && self.high_bitdepth {
            if self.twelve_bit {
                12
            } else {
                10
            }
        } else if self.high_bitdepth {
            10
        } else {
            8
        }
    }

    /// Frame rate derived from timing info, or 0.0 when absent.
    pub fn fps(&self) -> f64 {
        if !self.timing_info_present || self.num_units_in_display_tick == 0 {
            return 0.0;
        }
        let mut fps = f64::from(self.time_scale) / f64::from(self.num_units_in_display_tick);
        if self.equal_picture_interval {
            fps /= f64::from(self.num_ticks_per_picture_minus_1 + 1);
        }
        fps
    }

    /// Classify the dynamic range from the color descriptor.
    pub fn dynamic_range(&self) -> DynamicRange {
        if self.transfer_characteristics == TC_PQ || self.transfer_characteristics == TC_HLG {
            DynamicRange::Hdr
        } else if self.color_primaries == CP_BT_2020 {
            DynamicRange::WideGamut
        } else if self.color_primaries == CP_BT_709 || self.color_primaries == CP_BT_601 {
            DynamicRange::Sdr
        } else {
            DynamicRange::Unspecified
        }
    }
}
