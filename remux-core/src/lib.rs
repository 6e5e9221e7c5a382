//! # remux-core
//!
//! Core types and utilities shared by the remux muxing crates:
//! - Error handling types
//! - Bit-level reading, start-code scanning and emulation prevention
//! - The encoded packet abstraction pushed into muxers
//! - The internal high-resolution clock

pub mod bitstream;
pub mod clock;
pub mod error;
pub mod packet;

pub use error::{BitstreamError, Error, Result};
pub use packet::{Packet, PacketFlags};
