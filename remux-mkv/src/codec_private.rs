//! CodecPrivate construction.
//!
//! Each builder is a pure function of a [`ParameterSets`] snapshot taken at
//! header-commit time. A reader that reports a codec requiring parameter
//! sets but supplies none is a commit-time error; codecs that carry no
//! CodecPrivate produce `Ok(None)`.

use crate::error::{MkvError, Result};
use crate::reader::{CodecTag, HevcParameterSets, ParameterSets};
use byteorder::{BigEndian, WriteBytesExt};
use remux_av1::SequenceHeader;

/// Build the CodecPrivate payload for a track, dispatching on its codec tag.
pub fn build_codec_private(codec: CodecTag, params: &ParameterSets) -> Result<Option<Vec<u8>>> {
    match (codec, params) {
        (CodecTag::H264, ParameterSets::Avc { sps, pps }) => {
            build_avc_decoder_config(sps, pps).map(Some)
        }
        (CodecTag::Hevc, ParameterSets::Hevc(sets)) => build_hevc_decoder_config(sets).map(Some),
        (CodecTag::Vvc, ParameterSets::Vvc { vps, sps, pps }) => {
            build_vvc_private(vps, sps, pps).map(Some)
        }
        (CodecTag::Av1, ParameterSets::Av1(Some(seq))) => build_av1_config_record(seq).map(Some),
        (CodecTag::Av1, ParameterSets::Av1(None)) => Err(MkvError::TrackConfig(
            "AV1 reader has not parsed a sequence header".into(),
        )),
        (
            CodecTag::Aac,
            ParameterSets::Aac {
                profile,
                sample_rate_index,
                channel_config,
            },
        ) => Ok(Some(build_aac_audio_specific_config(
            *profile,
            *sample_rate_index,
            *channel_config,
        ))),
        (
            CodecTag::Mpeg2
            | CodecTag::VfwFourcc
            | CodecTag::Ac3
            | CodecTag::Eac3
            | CodecTag::TrueHd
            | CodecTag::Mlp
            | CodecTag::Dts
            | CodecTag::Lpcm
            | CodecTag::Mp3
            | CodecTag::SrtText
            | CodecTag::Pgs,
            _,
        ) => Ok(None),
        (codec, _) => Err(MkvError::TrackConfig(format!(
            "reader for {codec:?} supplied mismatched parameter sets"
        ))),
    }
}

/// AVCDecoderConfigurationRecord from serialized SPS/PPS NAL units.
///
/// Profile, compatibility and level are copied from SPS bytes 1..3;
/// `lengthSizeMinusOne` is fixed at 3 (4-byte NAL lengths).
pub fn build_avc_decoder_config(sps: &[Vec<u8>], pps: &[Vec<u8>]) -> Result<Vec<u8>> {
    let first_sps = sps
        .first()
        .ok_or_else(|| MkvError::TrackConfig("H.264 reader supplied no SPS".into()))?;

    let profile_idc = first_sps.get(1).copied().unwrap_or(66);
    let profile_compat = first_sps.get(2).copied().unwrap_or(0);
    let level_idc = first_sps.get(3).copied().unwrap_or(30);

    let mut record = Vec::with_capacity(64);
    record.push(1); // configurationVersion
    record.push(profile_idc);
    record.push(profile_compat);
    record.push(level_idc);
    record.push(0xFF); // reserved | lengthSizeMinusOne = 3
    record.push(0xE0 | (sps.len() & 0x1F) as u8); // reserved | numOfSequenceParameterSets

    for unit in sps {
        record.write_u16::<BigEndian>(unit.len() as u16)?;
        record.extend_from_slice(unit);
    }

    record.push(pps.len() as u8);
    for unit in pps {
        record.write_u16::<BigEndian>(unit.len() as u16)?;
        record.extend_from_slice(unit);
    }

    Ok(record)
}

/// HEVCDecoderConfigurationRecord from VPS/SPS/PPS plus the SPS fields.
///
/// Each parameter set is written as a single-entry array with its NAL unit
/// type code (32/33/34); `lengthSizeMinusOne` is fixed at 3.
pub fn build_hevc_decoder_config(sets: &HevcParameterSets) -> Result<Vec<u8>> {
    if sets.sps.is_empty() || sets.vps.is_empty() {
        return Err(MkvError::TrackConfig(
            "HEVC reader supplied no VPS/SPS".into(),
        ));
    }

    let mut record = Vec::with_capacity(64);
    record.push(1); // configurationVersion
    // general_profile_space(2) | general_tier_flag(1) | general_profile_idc(5)
    record.push(sets.profile_idc & 0x1F);
    // general_profile_compatibility_flags
    record.extend_from_slice(&[0; 4]);
    // general_constraint_indicator_flags
    record.extend_from_slice(&[0; 6]);
    record.push(sets.level_idc); // general_level_idc
    record.extend_from_slice(&[0xF0, 0x00]); // min_spatial_segmentation_idc
    record.push(0xFC); // parallelismType
    record.push(0xFC | (sets.chroma_format & 0x03));
    record.push(0xF8 | (sets.bit_depth_luma_minus8 & 0x07));
    record.push(0xF8 | (sets.bit_depth_chroma_minus8 & 0x07));
    record.extend_from_slice(&[0, 0]); // avgFrameRate
    // constantFrameRate(2) | numTemporalLayers(3) | temporalIdNested(1) | lengthSizeMinusOne(2)
    record.push(0x0F);

    let arrays: [(u8, &[u8]); 3] = [
        (32, &sets.vps),
        (33, &sets.sps),
        (34, sets.pps.as_deref().unwrap_or(&[])),
    ];
    let num_arrays = arrays.iter().filter(|(_, data)| !data.is_empty()).count();
    record.push(num_arrays as u8);

    for (nal_type, data) in arrays {
        if data.is_empty() {
            continue;
        }
        record.push(nal_type); // array_completeness=0 | NAL_unit_type
        record.write_u16::<BigEndian>(1)?; // numNalus
        record.write_u16::<BigEndian>(data.len() as u16)?;
        record.extend_from_slice(data);
    }

    Ok(record)
}

/// VVC CodecPrivate: the parameter-set NAL units concatenated with 32-bit
/// big-endian length prefixes.
///
/// This is the form other muxers emit in the wild rather than the
/// structured VvcDecoderConfigurationRecord.
pub fn build_vvc_private(vps: &[u8], sps: &[u8], pps: &[u8]) -> Result<Vec<u8>> {
    if sps.is_empty() {
        return Err(MkvError::TrackConfig("VVC reader supplied no SPS".into()));
    }

    let mut record = Vec::with_capacity(vps.len() + sps.len() + pps.len() + 12);
    for unit in [vps, sps, pps] {
        if unit.is_empty() {
            continue;
        }
        record.write_u32::<BigEndian>(unit.len() as u32)?;
        record.extend_from_slice(unit);
    }

    Ok(record)
}

/// The 4-byte AV1CodecConfigurationRecord.
///
/// The sequence header OBU is not appended: it rides in the first frame's
/// low-overhead data, which sidesteps emulation-prevention round-tripping
/// in the record.
pub fn build_av1_config_record(seq: &SequenceHeader) -> Result<Vec<u8>> {
    let bit_depth = seq.bit_depth();
    let high_bitdepth = u8::from(bit_depth > 8);
    let twelve_bit = u8::from(bit_depth == 12);

    Ok(vec![
        0x81, // marker(1) | version(7)
        ((seq.seq_profile & 0x07) << 5) | (seq.seq_level_idx_0 & 0x1F),
        ((seq.seq_tier_0 & 0x01) << 7)
            | (high_bitdepth << 6)
            | (twelve_bit << 5)
            | (u8::from(seq.mono_chrome) << 4)
            | (seq.chroma_subsampling_x << 3)
            | (seq.chroma_subsampling_y << 2)
            | (seq.chroma_sample_position & 0x03),
        0x00, // initial_presentation_delay_present(1) | reserved
    ])
}

/// The 2-byte AAC AudioSpecificConfig.
///
/// `[objectType:5 | freqIndex>>1:3] [freqIndex&1:1 | channelConfig:4 | pad:3]`
/// where objectType is the 0-based profile plus one.
pub fn build_aac_audio_specific_config(
    profile: u8,
    sample_rate_index: u8,
    channel_config: u8,
) -> Vec<u8> {
    let object_type = profile + 1;
    vec![
        (object_type << 3) | (sample_rate_index >> 1),
        ((sample_rate_index & 1) << 7) | (channel_config << 3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avc_record_layout() {
        let sps = vec![vec![0x67, 0x64, 0x00, 0x28, 0xAA]];
        let pps = vec![vec![0x68, 0xEE, 0x3C, 0x80]];
        let record = build_avc_decoder_config(&sps, &pps).unwrap();

        assert_eq!(record[0], 1); // version
        assert_eq!(record[1], 0x64); // profile from SPS[1]
        assert_eq!(record[2], 0x00); // compat from SPS[2]
        assert_eq!(record[3], 0x28); // level from SPS[3]
        assert_eq!(record[4], 0xFF); // lengthSizeMinusOne = 3
        assert_eq!(record[5], 0xE1); // one SPS
        assert_eq!(&record[6..8], &[0x00, 0x05]); // SPS length
        assert_eq!(&record[8..13], &sps[0][..]);
        assert_eq!(record[13], 1); // one PPS
        assert_eq!(&record[14..16], &[0x00, 0x04]); // PPS length
        assert_eq!(&record[16..], &pps[0][..]);
    }

    #[test]
    fn test_avc_record_requires_sps() {
        assert!(build_avc_decoder_config(&[], &[]).is_err());
    }

    #[test]
    fn test_avc_record_short_sps_falls_back() {
        let record = build_avc_decoder_config(&[vec![0x67]], &[]).unwrap();
        assert_eq!(record[1], 66);
        assert_eq!(record[2], 0);
        assert_eq!(record[3], 30);
    }

    #[test]
    fn test_hevc_record_layout() {
        let sets = HevcParameterSets {
            vps: vec![0x40, 0x01, 0x0C],
            sps: vec![0x42, 0x01, 0x01, 0x01],
            pps: Some(vec![0x44, 0x01]),
            profile_idc: 1,
            level_idc: 120,
            chroma_format: 1,
            bit_depth_luma_minus8: 0,
            bit_depth_chroma_minus8: 0,
        };
        let record = build_hevc_decoder_config(&sets).unwrap();

        assert_eq!(record[0], 1); // version
        assert_eq!(record[1], 0x01); // profile
        assert_eq!(record[12], 120); // level
        assert_eq!(record[16], 0xFC | 1); // chroma format
        assert_eq!(record[21], 0x0F); // lengthSizeMinusOne = 3
        assert_eq!(record[22], 3); // three arrays

        // First array: VPS, type 32, one NALU of 3 bytes
        assert_eq!(record[23], 32);
        assert_eq!(&record[24..26], &[0x00, 0x01]);
        assert_eq!(&record[26..28], &[0x00, 0x03]);
        assert_eq!(&record[28..31], &sets.vps[..]);
        // Second array: SPS, type 33
        assert_eq!(record[31], 33);
    }

    #[test]
    fn test_hevc_record_requires_vps_and_sps() {
        let sets = HevcParameterSets {
            sps: vec![0x42],
            ..Default::default()
        };
        assert!(build_hevc_decoder_config(&sets).is_err());
    }

    #[test]
    fn test_vvc_private_length_prefixes() {
        let record = build_vvc_private(&[0x79, 0x01], &[0x79, 0x02, 0x03], &[0x79]).unwrap();
        assert_eq!(
            record,
            vec![
                0, 0, 0, 2, 0x79, 0x01, // VPS
                0, 0, 0, 3, 0x79, 0x02, 0x03, // SPS
                0, 0, 0, 1, 0x79, // PPS
            ]
        );

        // Missing VPS/PPS are skipped, not zero-length-prefixed
        let record = build_vvc_private(&[], &[0x79, 0x02], &[]).unwrap();
        assert_eq!(record, vec![0, 0, 0, 2, 0x79, 0x02]);

        assert!(build_vvc_private(&[], &[], &[]).is_err());
    }

    #[test]
    fn test_av1_record() {
        let seq = SequenceHeader {
            seq_profile: 0,
            seq_level_idx_0: 8,
            high_bitdepth: true,
            chroma_subsampling_x: 1,
            chroma_subsampling_y: 1,
            ..Default::default()
        };
        let record = build_av1_config_record(&seq).unwrap();
        assert_eq!(record.len(), 4);
        assert_eq!(record[0], 0x81);
        assert_eq!(record[1], 0x08); // profile 0, level 8
        assert_eq!(record[2], (1 << 6) | (1 << 3) | (1 << 2)); // 10-bit 4:2:0
        assert_eq!(record[3], 0x00);
    }

    #[test]
    fn test_aac_config() {
        // LC profile (1), 48 kHz (index 3), stereo (2)
        let config = build_aac_audio_specific_config(1, 3, 2);
        assert_eq!(config, vec![(2 << 3) | (3 >> 1), ((3 & 1) << 7) | (2 << 3)]);
        assert_eq!(config, vec![0x11, 0x90]);
    }

    #[test]
    fn test_dispatch() {
        let private = build_codec_private(CodecTag::Ac3, &ParameterSets::None).unwrap();
        assert!(private.is_none());

        let private = build_codec_private(
            CodecTag::Aac,
            &ParameterSets::Aac {
                profile: 1,
                sample_rate_index: 3,
                channel_config: 2,
            },
        )
        .unwrap();
        assert_eq!(private.unwrap().len(), 2);

        // AV1 without a parsed sequence header is a commit-time error
        assert!(build_codec_private(CodecTag::Av1, &ParameterSets::Av1(None)).is_err());

        // Mismatched snapshot is an error too
        assert!(build_codec_private(CodecTag::H264, &ParameterSets::None).is_err());
    }
}
