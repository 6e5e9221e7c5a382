//! Packet abstraction for pre-encoded elementary-stream data.
//!
//! Elementary stream readers push packets into a muxer. A packet is one
//! fragment of one frame; large frames may be split across several packets
//! that share a PTS.

use crate::clock;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags for packet properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// This packet belongs to a keyframe (I-frame).
        const KEYFRAME = 0x0001;
        /// Parameter sets (SPS/PPS or a sequence header) are carried in-band
        /// within this GOP, so none need to be injected.
        const PARAMETER_SETS_IN_BAND = 0x0002;
        /// Out-of-band priority data (headers) rather than frame payload.
        const PRIORITY_DATA = 0x0004;
        /// Packet contains a disposable frame (can be dropped).
        const DISPOSABLE = 0x0008;
    }
}

/// An encoded media packet with an owned payload.
#[derive(Clone)]
pub struct Packet {
    data: Vec<u8>,
    /// Presentation timestamp in internal ticks (see [`crate::clock`]).
    pub pts: i64,
    /// Stream index this packet belongs to.
    pub stream_index: u32,
    /// Packet flags.
    pub flags: PacketFlags,
}

impl Packet {
    /// Create a new packet with owned data.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: 0,
            stream_index: 0,
            flags: PacketFlags::empty(),
        }
    }

    /// Create an empty packet.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Get the packet data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the size of the packet data.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if this packet is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if this is a keyframe packet.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }

    /// Set the keyframe flag.
    pub fn set_keyframe(&mut self, keyframe: bool) {
        if keyframe {
            self.flags.insert(PacketFlags::KEYFRAME);
        } else {
            self.flags.remove(PacketFlags::KEYFRAME);
        }
    }

    /// The PTS expressed in milliseconds.
    pub fn pts_millis(&self) -> i64 {
        clock::ticks_to_millis(self.pts)
    }

    /// Create a new packet with the specified PTS (internal ticks).
    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = pts;
        self
    }

    /// Create a new packet with the specified stream index.
    pub fn with_stream_index(mut self, index: u32) -> Self {
        self.stream_index = index;
        self
    }

    /// Create a new packet with the specified flags.
    pub fn with_flags(mut self, flags: PacketFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("stream_index", &self.stream_index)
            .field("flags", &self.flags)
            .finish()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::empty()
    }
}
