//! UDP header decoder.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// UDP header length.
pub const UDP_HEADER_LEN: usize = 8;

/// Decoded UDP header.
#[derive(Debug, Clone, Copy)]
pub struct UdpView<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    /// Declared datagram length, header included.
    pub length: u16,
    /// Datagram payload, clamped to the captured bytes.
    pub payload: &'a [u8],
}

/// Decode a UDP header.
pub fn decode(data: &[u8]) -> DecodeResult<UdpView<'_>> {
    if data.len() < UDP_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "udp",
            needed: UDP_HEADER_LEN,
            have: data.len(),
        });
    }

    let length = wire::read_u16(data, 4);
    if (length as usize) < UDP_HEADER_LEN {
        return Err(LayerError::InvalidField {
            layer: "udp",
            field: "length",
            value: length as u64,
        });
    }

    let payload_end = (length as usize).min(data.len());

    Ok(UdpView {
        src_port: wire::read_u16(data, 0),
        dst_port: wire::read_u16(data, 2),
        length,
        payload: &data[UDP_HEADER_LEN..payload_end],
    })
}
