//! Internal presentation clock.
//!
//! Packets carry PTS values in a high-resolution tick unit of
//! 196 x 27 MHz = 5,292,000,000 ticks per second. Matroska timestamps use
//! a TimecodeScale of 1,000,000 ns, i.e. milliseconds.

/// Internal PTS ticks per second (196 x 27 MHz).
pub const TICKS_PER_SECOND: i64 = 5_292_000_000;

/// Internal PTS ticks per millisecond.
pub const TICKS_PER_MS: i64 = TICKS_PER_SECOND / 1000;

/// Matroska TimecodeScale in nanoseconds (1 timecode unit = 1 ms).
pub const MKV_TIMECODE_SCALE_NS: u64 = 1_000_000;

/// Convert an internal tick count to milliseconds (truncating).
pub fn ticks_to_millis(ticks: i64) -> i64 {
    ticks / TICKS_PER_MS
}

/// Convert milliseconds to internal ticks.
pub fn millis_to_ticks(ms: i64) -> i64 {
    ms * TICKS_PER_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_constants() {
        assert_eq!(TICKS_PER_MS, 5_292_000);
        assert_eq!(TICKS_PER_SECOND, 196 * 27_000_000);
    }

    #[test]
    fn test_ticks_to_millis() {
        assert_eq!(ticks_to_millis(0), 0);
        assert_eq!(ticks_to_millis(TICKS_PER_MS), 1);
        assert_eq!(ticks_to_millis(TICKS_PER_SECOND), 1000);
        // Sub-millisecond remainders truncate
        assert_eq!(ticks_to_millis(TICKS_PER_MS + TICKS_PER_MS / 2), 1);
    }

    #[test]
    fn test_millis_roundtrip() {
        for ms in [0i64, 1, 33, 1000, 3_600_000] {
            assert_eq!(ticks_to_millis(millis_to_ticks(ms)), ms);
        }
    }
}
