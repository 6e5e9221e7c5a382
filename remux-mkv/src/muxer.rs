//! The Matroska muxer.
//!
//! Assembles pre-encoded elementary streams into a Matroska file:
//! deferred header commit, per-track frame accumulation, cluster
//! scheduling, cue indexing and end-of-file patching of the segment size
//! and duration.

use crate::codec_private::build_codec_private;
use crate::ebml;
use crate::elements::*;
use crate::error::{MkvError, Result};
use crate::reader::{AspectRatio, AudioMetrics, CodecReader, CodecTag, TrackType, VideoMetrics};
use crate::reformat;

use byteorder::{BigEndian, WriteBytesExt};
use rand::Rng;
use remux_core::clock::{MKV_TIMECODE_SCALE_NS, TICKS_PER_MS};
use remux_core::{Packet, PacketFlags};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Seek, SeekFrom, Write};

/// Maximum cluster duration before a forced split (milliseconds).
const CLUSTER_MAX_DURATION_MS: i64 = 5000;

/// Maximum cluster payload before a forced split.
const CLUSTER_MAX_SIZE: usize = 5 * 1024 * 1024;

/// Minimum cluster duration before a video keyframe opens a new cluster.
const CLUSTER_KEYFRAME_MIN_MS: i64 = 1000;

/// Application name stamped into MuxingApp/WritingApp.
const APP_NAME: &str = concat!("remux v", env!("CARGO_PKG_VERSION"));

/// Muxer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuxerState {
    /// Tracks may be registered; nothing written yet.
    Created,
    /// EBML header and Segment header written; buffering packets until
    /// every track has delivered at least one.
    AwaitingTrackData,
    /// SegmentInfo and Tracks committed; clusters are being written.
    HeaderWritten,
    /// Trailing elements written and placeholders patched.
    Finalized,
}

/// Per-track state.
struct Track<'r> {
    track_number: u64,
    track_uid: u64,
    codec: CodecTag,
    track_type: TrackType,
    reader: &'r dyn CodecReader,

    video: Option<VideoMetrics>,
    audio: Option<AudioMetrics>,
    codec_private: Option<Vec<u8>>,

    // Frame accumulation: readers may split one frame into several packets
    // sharing a PTS. They are merged here and written as one SimpleBlock.
    pending_pts: i64,
    pending_flags: PacketFlags,
    pending_data: Vec<u8>,
    has_pending: bool,
}

/// A cue entry collected while muxing, written into Cues at finalize.
#[derive(Debug, Clone, Copy)]
struct CueEntry {
    timecode_ms: i64,
    track_number: u64,
    /// Byte offset of the containing cluster from the segment data start.
    cluster_offset: u64,
}

/// Matroska muxer over a seekable writer.
///
/// Readers are borrowed for the duration of one mux session; the muxer
/// pulls codec parameters from them when the deferred header is committed.
pub struct MkvMuxer<'r, W: Write + Seek> {
    writer: W,
    state: MuxerState,

    tracks: BTreeMap<u32, Track<'r>>,
    next_track_number: u64,

    // Segment layout
    segment_start_pos: u64,
    segment_size_pos: u64,
    segment_info_pos: u64,
    tracks_pos: u64,
    cues_pos: Option<u64>,
    duration_value_pos: u64,

    // Cluster state
    cluster_buf: Vec<u8>,
    cluster_timecode_ms: i64,
    cluster_start_file_pos: u64,
    cluster_open: bool,

    cue_entries: Vec<CueEntry>,

    // Timecode tracking
    first_timecode: i64,
    first_timecode_set: bool,
    last_timecode_ms: i64,

    // Deferred header bootstrap
    seen_streams: BTreeSet<u32>,
    pre_header_packets: Vec<Packet>,
}

impl<'r, W: Write + Seek> MkvMuxer<'r, W> {
    /// Create a new muxer writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: MuxerState::Created,
            tracks: BTreeMap::new(),
            next_track_number: 1,
            segment_start_pos: 0,
            segment_size_pos: 0,
            segment_info_pos: 0,
            tracks_pos: 0,
            cues_pos: None,
            duration_value_pos: 0,
            cluster_buf: Vec::new(),
            cluster_timecode_ms: 0,
            cluster_start_file_pos: 0,
            cluster_open: false,
            cue_entries: Vec::new(),
            first_timecode: 0,
            first_timecode_set: false,
            last_timecode_ms: 0,
            seen_streams: BTreeSet::new(),
            pre_header_packets: Vec::new(),
        }
    }

    /// Register a stream. Returns the assigned Matroska track number.
    ///
    /// Track numbers are dense, 1-based and assigned in registration
    /// order; UIDs are random, non-zero and generated once.
    pub fn add_track(&mut self, stream_index: u32, reader: &'r dyn CodecReader) -> Result<u64> {
        if self.state != MuxerState::Created {
            return Err(MkvError::InvalidState(
                "tracks cannot be added after open()".into(),
            ));
        }
        if self.tracks.contains_key(&stream_index) {
            return Err(MkvError::TrackConfig(format!(
                "stream index {stream_index} already registered"
            )));
        }

        let codec = reader.codec();
        let track_number = self.next_track_number;
        self.next_track_number += 1;

        let mut rng = rand::thread_rng();
        let mut track_uid: u64 = rng.gen();
        while track_uid == 0 {
            track_uid = rng.gen();
        }

        self.tracks.insert(
            stream_index,
            Track {
                track_number,
                track_uid,
                codec,
                track_type: codec.track_type(),
                reader,
                video: reader.video_metrics(),
                audio: reader.audio_metrics(),
                codec_private: None,
                pending_pts: 0,
                pending_flags: PacketFlags::empty(),
                pending_data: Vec::new(),
                has_pending: false,
            },
        );

        Ok(track_number)
    }

    /// Write the EBML header and open the Segment.
    ///
    /// SegmentInfo and Tracks are deferred until every registered track
    /// has delivered at least one packet, so that the readers have parsed
    /// their codec headers by the time track properties are committed.
    pub fn open(&mut self) -> Result<()> {
        if self.state != MuxerState::Created {
            return Err(MkvError::InvalidState("open() already called".into()));
        }
        if self.tracks.is_empty() {
            return Err(MkvError::TrackConfig("no tracks registered".into()));
        }

        self.write_ebml_header()?;

        // Segment with an 8-byte unknown size, patched at finalize
        ebml::write_id(&mut self.writer, SEGMENT)?;
        self.segment_size_pos = self.position()?;
        ebml::write_unknown_size(&mut self.writer, 8)?;
        self.segment_start_pos = self.position()?;

        self.state = MuxerState::AwaitingTrackData;
        Ok(())
    }

    /// Push one packet into the muxer.
    ///
    /// Packets of one stream must arrive in non-decreasing PTS order;
    /// streams may interleave arbitrarily. The muxer copies what it keeps.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        match self.state {
            MuxerState::Created => {
                return Err(MkvError::InvalidState("open() not called".into()))
            }
            MuxerState::Finalized => {
                return Err(MkvError::InvalidState("muxer already finalized".into()))
            }
            _ => {}
        }

        if packet.is_empty() || !self.tracks.contains_key(&packet.stream_index) {
            return Ok(());
        }

        if self.state == MuxerState::AwaitingTrackData {
            self.seen_streams.insert(packet.stream_index);
            self.pre_header_packets.push(packet.clone());

            if self.seen_streams.len() == self.tracks.len() {
                self.commit_header()?;
                self.replay_buffered_packets()?;
            }
            return Ok(());
        }

        if !self.first_timecode_set {
            self.first_timecode = packet.pts;
            self.first_timecode_set = true;
        }

        self.accumulate(packet)
    }

    /// Flush all pending frames and the open cluster to the file.
    pub fn flush(&mut self) -> Result<()> {
        let indices: Vec<u32> = self.tracks.keys().copied().collect();
        for stream_index in indices {
            self.flush_pending_frame(stream_index)?;
        }
        self.flush_cluster()
    }

    /// Write the trailing elements and patch the header placeholders.
    ///
    /// Idempotent: calling it again after success is a no-op.
    pub fn finalize(&mut self) -> Result<()> {
        match self.state {
            MuxerState::Finalized => return Ok(()),
            MuxerState::Created => {
                return Err(MkvError::InvalidState("open() not called".into()))
            }
            _ => {}
        }

        // A track that never delivered data leaves the header uncommitted;
        // force it now so the file is structurally valid.
        if self.state == MuxerState::AwaitingTrackData {
            self.commit_header()?;
            self.replay_buffered_packets()?;
        }

        self.flush()?;

        self.write_cues()?;
        self.write_seek_head()?;

        // Patch the Segment size
        let segment_end = self.position()?;
        let segment_size = segment_end - self.segment_start_pos;
        self.writer.seek(SeekFrom::Start(self.segment_size_pos))?;
        ebml::write_vint_fixed(&mut self.writer, segment_size, 8)?;

        // Patch the Duration float: highest timecode plus one frame
        if self.duration_value_pos > 0 && self.last_timecode_ms > 0 {
            let frame_duration_ms = self
                .tracks
                .values()
                .find(|t| t.track_type == TrackType::Video)
                .and_then(|t| t.video)
                .filter(|v| v.fps > 0.0)
                .map_or(0.0, |v| 1000.0 / v.fps);
            let duration_ms = self.last_timecode_ms as f64 + frame_duration_ms;

            self.writer.seek(SeekFrom::Start(self.duration_value_pos))?;
            self.writer.write_f64::<BigEndian>(duration_ms)?;
        }

        self.writer.seek(SeekFrom::Start(segment_end))?;
        tracing::debug!(
            segment_size,
            duration_ms = self.last_timecode_ms,
            cues = self.cue_entries.len(),
            "finalized Matroska segment"
        );

        self.state = MuxerState::Finalized;
        Ok(())
    }

    /// Consume the muxer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    // ──────────────── Header writing ────────────────

    fn write_ebml_header(&mut self) -> Result<()> {
        let mut content = Vec::with_capacity(64);
        ebml::write_uint(&mut content, EBML_VERSION, 1)?;
        ebml::write_uint(&mut content, EBML_READ_VERSION, 1)?;
        ebml::write_uint(&mut content, EBML_MAX_ID_LENGTH, 4)?;
        ebml::write_uint(&mut content, EBML_MAX_SIZE_LENGTH, 8)?;
        ebml::write_string(&mut content, DOC_TYPE, DOC_TYPE_MATROSKA)?;
        ebml::write_uint(&mut content, DOC_TYPE_VERSION, DOC_TYPE_VERSION_VALUE)?;
        ebml::write_uint(&mut content, DOC_TYPE_READ_VERSION, DOC_TYPE_READ_VERSION_VALUE)?;

        ebml::write_master_open(&mut self.writer, EBML, content.len() as u64)?;
        self.writer.write_all(&content)?;
        Ok(())
    }

    /// Commit the deferred header: refresh track properties, build codec
    /// privates, then write SegmentInfo and Tracks.
    fn commit_header(&mut self) -> Result<()> {
        let indices: Vec<u32> = self.tracks.keys().copied().collect();

        for stream_index in indices {
            let (reader, codec, track_number) = {
                let track = &self.tracks[&stream_index];
                (track.reader, track.codec, track.track_number)
            };

            // Readers have parsed their headers by now; re-read everything
            let video = reader.video_metrics();
            let audio = reader.audio_metrics();
            let codec_private =
                build_codec_private(codec, &reader.parameter_sets()).map_err(|err| {
                    let message = match err {
                        MkvError::TrackConfig(message) => message,
                        other => other.to_string(),
                    };
                    MkvError::InvalidCodecParameters {
                        track_number,
                        message,
                    }
                })?;

            let track = self.tracks.get_mut(&stream_index).expect("track exists");
            track.video = video;
            track.audio = audio;
            track.codec_private = codec_private;
        }

        self.write_segment_info()?;
        self.write_tracks()?;

        tracing::debug!(tracks = self.tracks.len(), "committed deferred header");
        self.state = MuxerState::HeaderWritten;
        Ok(())
    }

    fn write_segment_info(&mut self) -> Result<()> {
        self.segment_info_pos = self.position()? - self.segment_start_pos;

        let mut content = Vec::with_capacity(64);
        ebml::write_uint(&mut content, TIMECODE_SCALE, MKV_TIMECODE_SCALE_NS)?;

        // Duration placeholder, overwritten at finalize.
        // Element layout: 2-byte ID + 1-byte size + float64 payload.
        let duration_elem_offset = content.len();
        ebml::write_float(&mut content, DURATION, 0.0)?;

        ebml::write_string(&mut content, MUXING_APP, APP_NAME)?;
        ebml::write_string(&mut content, WRITING_APP, APP_NAME)?;

        ebml::write_master_open(&mut self.writer, INFO, content.len() as u64)?;
        let content_start = self.position()?;
        self.duration_value_pos = content_start + duration_elem_offset as u64 + 3;
        self.writer.write_all(&content)?;
        Ok(())
    }

    fn write_tracks(&mut self) -> Result<()> {
        self.tracks_pos = self.position()? - self.segment_start_pos;

        let mut all_entries = Vec::new();
        for track in self.tracks.values() {
            let entry = build_track_entry(track)?;
            ebml::write_binary(&mut all_entries, TRACK_ENTRY, &entry)?;
        }

        ebml::write_master_open(&mut self.writer, TRACKS, all_entries.len() as u64)?;
        self.writer.write_all(&all_entries)?;
        Ok(())
    }

    /// Determine the time origin and replay the buffered packets through
    /// the normal path.
    fn replay_buffered_packets(&mut self) -> Result<()> {
        if self.pre_header_packets.is_empty() {
            return Ok(());
        }

        // The minimum PTS across all buffered packets becomes the origin,
        // so no track produces a negative relative timestamp.
        let min_pts = self
            .pre_header_packets
            .iter()
            .map(|p| p.pts)
            .min()
            .expect("buffer not empty");
        self.first_timecode = min_pts;
        self.first_timecode_set = true;

        let packets = std::mem::take(&mut self.pre_header_packets);
        for packet in &packets {
            self.accumulate(packet)?;
        }
        Ok(())
    }

    // ──────────────── Frame accumulation ────────────────

    /// Merge a packet into its track's pending frame, flushing the
    /// previous frame when the PTS changes.
    fn accumulate(&mut self, packet: &Packet) -> Result<()> {
        let needs_flush = {
            let Some(track) = self.tracks.get(&packet.stream_index) else {
                return Ok(());
            };
            track.has_pending && track.pending_pts != packet.pts
        };
        if needs_flush {
            self.flush_pending_frame(packet.stream_index)?;
        }

        let track = self
            .tracks
            .get_mut(&packet.stream_index)
            .expect("track exists");
        if track.has_pending {
            // Same PTS: a continuation of the current frame. Keep the
            // keyframe bit if any fragment carries it.
            track.pending_flags |= packet.flags & PacketFlags::KEYFRAME;
        } else {
            track.pending_pts = packet.pts;
            track.pending_flags = packet.flags;
            track.has_pending = true;
        }
        track.pending_data.extend_from_slice(packet.data());
        Ok(())
    }

    /// Write a track's pending frame as one SimpleBlock.
    fn flush_pending_frame(&mut self, stream_index: u32) -> Result<()> {
        let (frame, pts, flags, track_number, track_type, codec) = {
            let Some(track) = self.tracks.get_mut(&stream_index) else {
                return Ok(());
            };
            if !track.has_pending || track.pending_data.is_empty() {
                track.has_pending = false;
                track.pending_data.clear();
                return Ok(());
            }
            track.has_pending = false;
            (
                std::mem::take(&mut track.pending_data),
                track.pending_pts,
                track.pending_flags,
                track.track_number,
                track.track_type,
                track.codec,
            )
        };

        // Container-mandated byte-level reformat; a conversion that yields
        // nothing falls back to the raw payload
        let payload = match reformat::reformat_frame(codec, &frame) {
            Some(converted) if !converted.is_empty() => converted,
            _ => frame,
        };

        let rel_ms = (pts - self.first_timecode) / TICKS_PER_MS;
        if rel_ms > self.last_timecode_ms {
            self.last_timecode_ms = rel_ms;
        }

        let is_keyframe = flags.contains(PacketFlags::KEYFRAME);
        let is_video = track_type == TrackType::Video;
        let in_cluster_ms = rel_ms - self.cluster_timecode_ms;

        let need_new_cluster = !self.cluster_open
            || in_cluster_ms >= CLUSTER_MAX_DURATION_MS
            || self.cluster_buf.len() >= CLUSTER_MAX_SIZE
            || (is_video && is_keyframe && in_cluster_ms >= CLUSTER_KEYFRAME_MIN_MS)
            || in_cluster_ms > i64::from(i16::MAX)
            || in_cluster_ms < i64::from(i16::MIN);

        if need_new_cluster {
            self.start_cluster(rel_ms)?;
        }

        if is_video && is_keyframe {
            self.cue_entries.push(CueEntry {
                timecode_ms: rel_ms,
                track_number,
                cluster_offset: self.cluster_start_file_pos,
            });
        }

        // SimpleBlock: VINT track number, int16 relative time, flags, payload
        let rel_time = (rel_ms - self.cluster_timecode_ms) as i16;

        let mut track_num_vint = Vec::with_capacity(2);
        ebml::write_vint(&mut track_num_vint, track_number)?;
        let block_size = track_num_vint.len() + 2 + 1 + payload.len();

        ebml::write_id(&mut self.cluster_buf, SIMPLE_BLOCK)?;
        ebml::write_vint(&mut self.cluster_buf, block_size as u64)?;
        self.cluster_buf.extend_from_slice(&track_num_vint);
        self.cluster_buf.write_i16::<BigEndian>(rel_time)?;
        self.cluster_buf
            .push(if is_keyframe { 0x80 } else { 0x00 });
        self.cluster_buf.extend_from_slice(&payload);

        Ok(())
    }

    // ──────────────── Cluster writing ────────────────

    /// Flush the current cluster (if any) and open a new one.
    fn start_cluster(&mut self, timecode_ms: i64) -> Result<()> {
        if self.cluster_open {
            self.flush_cluster()?;
        }

        self.cluster_timecode_ms = timecode_ms;
        self.cluster_buf.clear();
        self.cluster_open = true;
        self.cluster_start_file_pos = self.position()? - self.segment_start_pos;

        ebml::write_uint(&mut self.cluster_buf, TIMECODE, timecode_ms.max(0) as u64)?;
        Ok(())
    }

    /// Write the buffered cluster as a single known-size element.
    fn flush_cluster(&mut self) -> Result<()> {
        if !self.cluster_open || self.cluster_buf.is_empty() {
            return Ok(());
        }

        ebml::write_master_open(&mut self.writer, CLUSTER, self.cluster_buf.len() as u64)?;
        self.writer.write_all(&self.cluster_buf)?;

        self.cluster_buf.clear();
        self.cluster_open = false;
        Ok(())
    }

    // ──────────────── Trailing elements ────────────────

    fn write_cues(&mut self) -> Result<()> {
        if self.cue_entries.is_empty() {
            return Ok(());
        }

        self.cues_pos = Some(self.position()? - self.segment_start_pos);

        let mut all_points = Vec::new();
        for cue in &self.cue_entries {
            let mut positions = Vec::with_capacity(16);
            ebml::write_uint(&mut positions, CUE_TRACK, cue.track_number)?;
            ebml::write_uint(&mut positions, CUE_CLUSTER_POSITION, cue.cluster_offset)?;

            let mut point = Vec::with_capacity(32);
            ebml::write_uint(&mut point, CUE_TIME, cue.timecode_ms.max(0) as u64)?;
            ebml::write_binary(&mut point, CUE_TRACK_POSITIONS, &positions)?;

            ebml::write_binary(&mut all_points, CUE_POINT, &point)?;
        }

        ebml::write_master_open(&mut self.writer, CUES, all_points.len() as u64)?;
        self.writer.write_all(&all_points)?;
        Ok(())
    }

    fn write_seek_head(&mut self) -> Result<()> {
        let mut items = vec![(INFO, self.segment_info_pos), (TRACKS, self.tracks_pos)];
        if let Some(cues_pos) = self.cues_pos {
            items.push((CUES, cues_pos));
        }

        let mut all_entries = Vec::new();
        for (id, pos) in items {
            let mut id_bytes = Vec::with_capacity(4);
            ebml::write_id(&mut id_bytes, id)?;

            let mut entry = Vec::with_capacity(16);
            ebml::write_binary(&mut entry, SEEK_ID, &id_bytes)?;
            ebml::write_uint(&mut entry, SEEK_POSITION, pos)?;

            ebml::write_binary(&mut all_entries, SEEK, &entry)?;
        }

        ebml::write_master_open(&mut self.writer, SEEK_HEAD, all_entries.len() as u64)?;
        self.writer.write_all(&all_entries)?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.writer.stream_position()?)
    }
}

/// Serialize the inner content of one TrackEntry.
fn build_track_entry(track: &Track<'_>) -> Result<Vec<u8>> {
    let mut content = Vec::with_capacity(
        128 + track
            .codec_private
            .as_ref()
            .map_or(0, |private| private.len()),
    );

    ebml::write_uint(&mut content, TRACK_NUMBER, track.track_number)?;
    ebml::write_uint(&mut content, TRACK_UID, track.track_uid)?;
    ebml::write_uint(&mut content, TRACK_TYPE, track.track_type as u8 as u64)?;
    ebml::write_uint(&mut content, FLAG_LACING, 0)?;
    ebml::write_string(&mut content, CODEC_ID, track.codec.matroska_codec_id())?;

    if let Some(private) = &track.codec_private {
        ebml::write_binary(&mut content, CODEC_PRIVATE, private)?;
    }

    if let Some(video) = &track.video {
        if video.fps > 0.0 {
            let duration_ns = (1_000_000_000.0 / video.fps) as u64;
            ebml::write_uint(&mut content, DEFAULT_DURATION, duration_ns)?;
        }
    }

    if track.track_type == TrackType::Video {
        if let Some(video) = &track.video {
            if video.width > 0 && video.height > 0 {
                let mut video_content = Vec::with_capacity(32);
                ebml::write_uint(&mut video_content, PIXEL_WIDTH, u64::from(video.width))?;
                ebml::write_uint(&mut video_content, PIXEL_HEIGHT, u64::from(video.height))?;
                if video.interlaced {
                    ebml::write_uint(&mut video_content, FLAG_INTERLACED, 1)?;
                }

                if let Some((dw, dh)) = display_size(video) {
                    ebml::write_uint(&mut video_content, DISPLAY_WIDTH, u64::from(dw))?;
                    ebml::write_uint(&mut video_content, DISPLAY_HEIGHT, u64::from(dh))?;
                }

                ebml::write_binary(&mut content, VIDEO, &video_content)?;
            }
        }
    }

    if track.track_type == TrackType::Audio {
        if let Some(audio) = &track.audio {
            if audio.sample_rate > 0 {
                let mut audio_content = Vec::with_capacity(24);
                ebml::write_float(
                    &mut audio_content,
                    SAMPLING_FREQUENCY,
                    f64::from(audio.sample_rate),
                )?;
                ebml::write_uint(&mut audio_content, CHANNELS, u64::from(audio.channels))?;
                if let Some(bit_depth) = audio.bit_depth {
                    ebml::write_uint(&mut audio_content, BIT_DEPTH, u64::from(bit_depth))?;
                }

                ebml::write_binary(&mut content, AUDIO, &audio_content)?;
            }
        }
    }

    Ok(content)
}

/// DisplayWidth/DisplayHeight for streams with an explicit non-default
/// aspect ratio. Returns `None` when the pixel size already matches.
fn display_size(video: &VideoMetrics) -> Option<(u32, u32)> {
    let height = video.height;
    let display_width = match video.aspect_ratio {
        AspectRatio::KeepDefault | AspectRatio::Vga => return None,
        AspectRatio::Ratio4x3 => (height * 4 + 1) / 3,
        AspectRatio::Ratio16x9 => (height * 16 + 4) / 9,
        AspectRatio::Ratio221x100 => (height * 221 + 50) / 100,
    };

    if display_width != video.width {
        Some((display_width, height))
    } else {
        None
    }
}
