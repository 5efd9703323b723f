//! TCP header decoder.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Minimum TCP header length (data offset = 5).
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// TCP flag bits as they appear in the low byte of the flags word.
#[allow(dead_code)]
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
    pub const URG: u8 = 0x20;
    pub const ECE: u8 = 0x40;
    pub const CWR: u8 = 0x80;
}

/// Decoded TCP header.
#[derive(Debug, Clone, Copy)]
pub struct TcpView<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
    pub ack: u32,
    /// Header length in bytes (data offset * 4), options included.
    pub header_len: usize,
    pub flags: u8,
    pub window: u16,
    /// Segment payload: whatever follows the option-extended header.
    pub payload: &'a [u8],
}

impl TcpView<'_> {
    pub fn fin(&self) -> bool {
        self.flags & flags::FIN != 0
    }
    pub fn syn(&self) -> bool {
        self.flags & flags::SYN != 0
    }
    pub fn rst(&self) -> bool {
        self.flags & flags::RST != 0
    }
    pub fn ack_set(&self) -> bool {
        self.flags & flags::ACK != 0
    }
}

/// Decode a TCP header.
pub fn decode(data: &[u8]) -> DecodeResult<TcpView<'_>> {
    if data.len() < TCP_MIN_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "tcp",
            needed: TCP_MIN_HEADER_LEN,
            have: data.len(),
        });
    }

    let header_len = ((data[12] >> 4) as usize) * 4;
    if header_len < TCP_MIN_HEADER_LEN {
        return Err(LayerError::InvalidField {
            layer: "tcp",
            field: "data_offset",
            value: (header_len / 4) as u64,
        });
    }
    if data.len() < header_len {
        return Err(LayerError::PacketTooShort {
            layer: "tcp",
            needed: header_len,
            have: data.len(),
        });
    }

    Ok(TcpView {
        src_port: wire::read_u16(data, 0),
        dst_port: wire::read_u16(data, 2),
        seq: wire::read_u32(data, 4),
        ack: wire::read_u32(data, 8),
        header_len,
        flags: data[13],
        window: wire::read_u16(data, 14),
        payload: &data[header_len..],
    })
}
