//! Ethernet II link-layer decoder.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Ethernet II header length in bytes.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Well-known EtherType values (IEEE 802).
#[allow(dead_code)]
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const VLAN: u16 = 0x8100;
    pub const IPV6: u16 = 0x86DD;
    pub const QINQ: u16 = 0x88A8;
    pub const QINQ_OLD: u16 = 0x9100;
    pub const MPLS: u16 = 0x8847;
}

/// Decoded Ethernet II header.
#[derive(Debug, Clone, Copy)]
pub struct EthernetView<'a> {
    pub dst_mac: [u8; 6],
    pub src_mac: [u8; 6],
    pub ethertype: u16,
    /// Bytes following the 14-byte header.
    pub payload: &'a [u8],
}

/// Decode an Ethernet II frame header.
pub fn decode(data: &[u8]) -> DecodeResult<EthernetView<'_>> {
    if data.len() < ETHERNET_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "ethernet",
            needed: ETHERNET_HEADER_LEN,
            have: data.len(),
        });
    }

    let mut dst_mac = [0u8; 6];
    let mut src_mac = [0u8; 6];
    dst_mac.copy_from_slice(&data[0..6]);
    src_mac.copy_from_slice(&data[6..12]);

    Ok(EthernetView {
        dst_mac,
        src_mac,
        ethertype: wire::read_u16(data, 12),
        payload: &data[ETHERNET_HEADER_LEN..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ethernet() {
        let frame = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst mac
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src mac
            0x08, 0x00, // ethertype IPv4
            0x45, 0x00, // payload start
        ];

        let eth = decode(&frame).unwrap();
        assert_eq!(eth.dst_mac, [0xff; 6]);
        assert_eq!(eth.src_mac, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(eth.ethertype, ethertype::IPV4);
        assert_eq!(eth.payload, &[0x45, 0x00]);
    }

    #[test]
    fn test_decode_too_short() {
        let short = [0u8; 13];
        let err = decode(&short).unwrap_err();
        assert!(matches!(err, LayerError::PacketTooShort { layer: "ethernet", .. }));
    }
}
