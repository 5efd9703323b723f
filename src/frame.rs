//! Per-frame capture metadata.

/// Capture header accompanying one raw frame, as delivered by a
/// packet-capture source.
///
/// `cap_len` may be smaller than `orig_len` when the capture was
/// truncated by a snap length; decoders never read past the captured
/// bytes regardless of what inner length fields declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Capture timestamp in microseconds since the epoch.
    pub timestamp_us: i64,
    /// Length of the frame as it appeared on the wire.
    pub orig_len: u32,
    /// Number of bytes actually captured.
    pub cap_len: u32,
}

impl FrameHeader {
    /// Build a header for a fully captured frame.
    pub fn full(timestamp_us: i64, len: u32) -> Self {
        Self {
            timestamp_us,
            orig_len: len,
            cap_len: len,
        }
    }
}
