//! IPv6 header decoder.
//!
//! Walks the extension-header chain (hop-by-hop, routing, destination
//! options, AH) to locate the transport header. IPv6 fragments are not
//! reassembled; a fragment extension header ends descent for the frame.

use std::net::Ipv6Addr;

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Fixed IPv6 header length.
pub const IPV6_HEADER_LEN: usize = 40;

/// Extension-header chain cap; a longer chain is treated as malformed.
const MAX_EXTENSION_HEADERS: usize = 8;

/// IPv6 next-header values for extension headers.
#[allow(dead_code)]
pub mod next_header {
    pub const HOP_BY_HOP: u8 = 0;
    pub const ROUTING: u8 = 43;
    pub const FRAGMENT: u8 = 44;
    pub const ESP: u8 = 50;
    pub const AH: u8 = 51;
    pub const NO_NEXT: u8 = 59;
    pub const DEST_OPTIONS: u8 = 60;
}

/// Decoded IPv6 header with the extension chain already skipped.
#[derive(Debug, Clone, Copy)]
pub struct Ipv6View<'a> {
    pub src: Ipv6Addr,
    pub dst: Ipv6Addr,
    /// Transport protocol after any extension headers.
    pub protocol: u8,
    pub hop_limit: u8,
    /// Declared payload length (everything after the fixed header).
    pub payload_len: u16,
    /// Transport payload, clamped to the captured bytes.
    pub payload: &'a [u8],
}

fn addr(data: &[u8], offset: usize) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&data[offset..offset + 16]);
    Ipv6Addr::from(octets)
}

/// Decode an IPv6 header and skip its extension chain.
pub fn decode(data: &[u8]) -> DecodeResult<Ipv6View<'_>> {
    if data.len() < IPV6_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "ipv6",
            needed: IPV6_HEADER_LEN,
            have: data.len(),
        });
    }

    let version = data[0] >> 4;
    if version != 6 {
        return Err(LayerError::InvalidField {
            layer: "ipv6",
            field: "version",
            value: version as u64,
        });
    }

    let payload_len = wire::read_u16(data, 4);

    // Clamp to both the declared payload length and the captured bytes.
    let end = IPV6_HEADER_LEN + (payload_len as usize).min(data.len() - IPV6_HEADER_LEN);

    let mut proto = data[6];
    let mut offset = IPV6_HEADER_LEN;

    for _ in 0..MAX_EXTENSION_HEADERS {
        match proto {
            next_header::HOP_BY_HOP
            | next_header::ROUTING
            | next_header::DEST_OPTIONS
            | next_header::AH => {
                if end < offset + 2 {
                    return Err(LayerError::PacketTooShort {
                        layer: "ipv6",
                        needed: offset + 2,
                        have: end,
                    });
                }
                let ext_len = if proto == next_header::AH {
                    // AH length is in 4-byte units, minus two
                    (data[offset + 1] as usize + 2) * 4
                } else {
                    (data[offset + 1] as usize + 1) * 8
                };
                if end < offset + ext_len {
                    return Err(LayerError::PacketTooShort {
                        layer: "ipv6",
                        needed: offset + ext_len,
                        have: end,
                    });
                }
                proto = data[offset];
                offset += ext_len;
            }
            next_header::FRAGMENT | next_header::ESP | next_header::NO_NEXT => {
                // Not interpreted further: no v6 reassembly, no ESP parsing
                return Err(LayerError::InvalidField {
                    layer: "ipv6",
                    field: "next_header",
                    value: proto as u64,
                });
            }
            _ => break,
        }
    }

    Ok(Ipv6View {
        src: addr(data, 8),
        dst: addr(data, 24),
        protocol: proto,
        hop_limit: data[7],
        payload_len,
        payload: &data[offset..end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ipv4::ip_protocol;

    fn make_header(next: u8, payload_len: u16) -> Vec<u8> {
        let mut hdr = vec![0u8; IPV6_HEADER_LEN];
        hdr[0] = 0x60;
        wire::write_u16(&mut hdr, 4, payload_len);
        hdr[6] = next;
        hdr[7] = 64; // hop limit
        hdr[8..24].copy_from_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        hdr[24..40].copy_from_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
        hdr
    }

    #[test]
    fn test_decode_basic() {
        let mut pkt = make_header(ip_protocol::UDP, 4);
        pkt.extend_from_slice(&[1, 2, 3, 4]);

        let ip = decode(&pkt).unwrap();
        assert_eq!(ip.protocol, ip_protocol::UDP);
        assert_eq!(ip.hop_limit, 64);
        assert_eq!(ip.payload, &[1, 2, 3, 4]);
        assert_eq!(ip.src.segments()[0], 0x2001);
    }

    #[test]
    fn test_extension_header_skipped() {
        // Hop-by-hop (8 bytes) then UDP payload
        let mut pkt = make_header(next_header::HOP_BY_HOP, 12);
        pkt.push(ip_protocol::UDP); // next header
        pkt.push(0); // hdr ext len: (0 + 1) * 8 = 8 bytes
        pkt.extend_from_slice(&[0u8; 6]);
        pkt.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);

        let ip = decode(&pkt).unwrap();
        assert_eq!(ip.protocol, ip_protocol::UDP);
        assert_eq!(ip.payload, &[0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn test_fragment_header_halts() {
        let mut pkt = make_header(next_header::FRAGMENT, 16);
        pkt.extend_from_slice(&[0u8; 16]);
        assert!(decode(&pkt).is_err());
    }

    #[test]
    fn test_reject_wrong_version() {
        let mut pkt = make_header(ip_protocol::TCP, 0);
        pkt[0] = 0x45;
        assert!(matches!(
            decode(&pkt).unwrap_err(),
            LayerError::InvalidField { field: "version", .. }
        ));
    }

    #[test]
    fn test_truncated_extension_rejected() {
        // Claims a routing header but capture ends inside it
        let mut pkt = make_header(next_header::ROUTING, 24);
        pkt.push(ip_protocol::TCP);
        pkt.push(2); // 24-byte extension, but only 2 captured
        assert!(decode(&pkt).is_err());
    }

    #[test]
    fn test_payload_clamped_to_declared_length() {
        let mut pkt = make_header(ip_protocol::UDP, 2);
        pkt.extend_from_slice(&[1, 2, 3, 4]); // 2 bytes beyond declared
        let ip = decode(&pkt).unwrap();
        assert_eq!(ip.payload, &[1, 2]);
    }
}
