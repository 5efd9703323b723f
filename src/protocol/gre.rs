//! GRE (Generic Routing Encapsulation) decoder.
//!
//! RFC 2784 base header plus the RFC 2890 key/sequence extensions.
//! Version 1 (PPTP enhanced GRE) and the legacy routing-present form
//! have different layouts and are rejected rather than misparsed.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Minimum GRE header: flags/version word plus protocol type.
pub const GRE_MIN_HEADER_LEN: usize = 4;

/// Decoded GRE header.
#[derive(Debug, Clone, Copy)]
pub struct GreView<'a> {
    /// EtherType of the encapsulated protocol.
    pub protocol: u16,
    pub key: Option<u32>,
    pub sequence: Option<u32>,
    /// Header length including optional fields.
    pub header_len: usize,
    pub payload: &'a [u8],
}

/// Decode a GRE header.
pub fn decode(data: &[u8]) -> DecodeResult<GreView<'_>> {
    if data.len() < GRE_MIN_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "gre",
            needed: GRE_MIN_HEADER_LEN,
            have: data.len(),
        });
    }

    let flags = wire::read_u16(data, 0);

    let version = (flags & 0x0007) as u8;
    if version != 0 {
        return Err(LayerError::InvalidField {
            layer: "gre",
            field: "version",
            value: version as u64,
        });
    }
    // Routing present: variable-length SRE list, layout unknown here
    if flags & 0x4000 != 0 {
        return Err(LayerError::InvalidField {
            layer: "gre",
            field: "routing_present",
            value: 1,
        });
    }

    let protocol = wire::read_u16(data, 2);
    let mut offset = 4;

    // Checksum + reserved word
    if flags & 0x8000 != 0 {
        offset += 4;
    }

    let key = if flags & 0x2000 != 0 {
        if data.len() < offset + 4 {
            return Err(LayerError::PacketTooShort {
                layer: "gre",
                needed: offset + 4,
                have: data.len(),
            });
        }
        let key = wire::read_u32(data, offset);
        offset += 4;
        Some(key)
    } else {
        None
    };

    let sequence = if flags & 0x1000 != 0 {
        if data.len() < offset + 4 {
            return Err(LayerError::PacketTooShort {
                layer: "gre",
                needed: offset + 4,
                have: data.len(),
            });
        }
        let seq = wire::read_u32(data, offset);
        offset += 4;
        Some(seq)
    } else {
        None
    };

    if data.len() < offset {
        return Err(LayerError::PacketTooShort {
            layer: "gre",
            needed: offset,
            have: data.len(),
        });
    }

    Ok(GreView {
        protocol,
        key,
        sequence,
        header_len: offset,
        payload: &data[offset..],
    })
}
