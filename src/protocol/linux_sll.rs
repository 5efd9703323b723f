//! Linux SLL (cooked capture) link-layer decoder.
//!
//! The 16-byte cooked header is produced when capturing on the "any"
//! pseudo-interface (LINKTYPE_LINUX_SLL = 113). Only the trailing
//! protocol field matters for dispatch; it carries an EtherType for
//! ARPHRD_ETHER-style captures.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Linux SLL header length in bytes.
pub const SLL_HEADER_LEN: usize = 16;

/// Decoded Linux cooked-capture header.
#[derive(Debug, Clone, Copy)]
pub struct SllView<'a> {
    /// Where the packet was headed relative to the capturing host.
    pub packet_type: u16,
    /// ARPHRD hardware type of the originating interface.
    pub arphrd_type: u16,
    /// EtherType of the encapsulated protocol.
    pub protocol: u16,
    pub payload: &'a [u8],
}

/// Decode a Linux SLL header.
pub fn decode(data: &[u8]) -> DecodeResult<SllView<'_>> {
    if data.len() < SLL_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "linux_sll",
            needed: SLL_HEADER_LEN,
            have: data.len(),
        });
    }

    Ok(SllView {
        packet_type: wire::read_u16(data, 0),
        arphrd_type: wire::read_u16(data, 2),
        protocol: wire::read_u16(data, 14),
        payload: &data[SLL_HEADER_LEN..],
    })
}
