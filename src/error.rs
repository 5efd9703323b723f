//! Error types for pcap-layers.
//!
//! Two distinct failure categories:
//!
//! - [`enum@Error`] - configuration-time failures, surfaced to the caller
//!   so startup can abort
//! - [`LayerError`] - per-layer decode rejections from untrusted packet
//!   bytes; these never escape the frame entry point, they only end
//!   descent for the affected frame

use thiserror::Error;

/// Configuration errors, fatal to the configuring call only.
#[derive(Error, Debug)]
pub enum Error {
    /// The datalink type is not one of the supported link-layer variants.
    #[error("unsupported link type: {link_type}")]
    UnsupportedLinkType { link_type: u16 },
}

/// Reasons a layer decoder rejects its input.
///
/// A rejection is the normal, non-fatal outcome for malformed or
/// truncated captures: dispatch for that branch halts, siblings and
/// ancestors are unaffected, and no error propagates out of
/// [`crate::Dissector::handle_frame`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// Fewer bytes available than the protocol's minimum header size,
    /// or than a declared header/option length requires.
    #[error("{layer}: packet too short (need {needed} bytes, have {have})")]
    PacketTooShort {
        layer: &'static str,
        needed: usize,
        have: usize,
    },

    /// A header field holds a value the decoder cannot accept.
    #[error("{layer}: invalid {field}: {value:#x}")]
    InvalidField {
        layer: &'static str,
        field: &'static str,
        value: u64,
    },

    /// Nested-tunnel depth exceeded the recursion cap.
    #[error("tunnel nesting deeper than {max} levels")]
    TunnelTooDeep { max: u8 },
}

/// Result type alias for layer decoding.
pub type DecodeResult<T> = std::result::Result<T, LayerError>;
