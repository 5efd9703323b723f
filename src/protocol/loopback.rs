//! BSD loopback (NULL/LOOP) link-layer decoder.
//!
//! NULL and LOOP frames start with a 4-byte address-family word. LOOP
//! stores it big-endian; NULL stores it in the byte order of the host
//! that wrote the capture, so the family is accepted in either byte
//! order here.

use crate::error::{DecodeResult, LayerError};
use crate::wire;

/// Loopback pseudo-header length in bytes.
pub const LOOPBACK_HEADER_LEN: usize = 4;

/// Address family of the encapsulated datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Inet,
    Inet6,
}

/// AF_INET across platforms.
const AF_INET: u32 = 2;
/// AF_INET6 values seen in the wild (Linux, FreeBSD, Darwin, OpenBSD).
const AF_INET6: [u32; 4] = [10, 28, 30, 24];

/// Decoded loopback pseudo-header.
#[derive(Debug, Clone, Copy)]
pub struct LoopbackView<'a> {
    pub family: Family,
    pub payload: &'a [u8],
}

fn classify(family: u32) -> Option<Family> {
    if family == AF_INET {
        Some(Family::Inet)
    } else if AF_INET6.contains(&family) {
        Some(Family::Inet6)
    } else {
        None
    }
}

/// Decode a NULL/LOOP pseudo-header.
pub fn decode(data: &[u8]) -> DecodeResult<LoopbackView<'_>> {
    if data.len() < LOOPBACK_HEADER_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "loopback",
            needed: LOOPBACK_HEADER_LEN,
            have: data.len(),
        });
    }

    let be = wire::read_u32(data, 0);
    let family = classify(be)
        .or_else(|| classify(be.swap_bytes()))
        .ok_or(LayerError::InvalidField {
            layer: "loopback",
            field: "family",
            value: be as u64,
        })?;

    Ok(LoopbackView {
        family,
        payload: &data[LOOPBACK_HEADER_LEN..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_big_endian() {
        let frame = [0x00, 0x00, 0x00, 0x02, 0x45];
        let lo = decode(&frame).unwrap();
        assert_eq!(lo.family, Family::Inet);
        assert_eq!(lo.payload, &[0x45]);
    }

    #[test]
    fn test_family_little_endian() {
        // NULL header written by a little-endian host
        let frame = [0x02, 0x00, 0x00, 0x00, 0x45];
        assert_eq!(decode(&frame).unwrap().family, Family::Inet);
    }

    #[test]
    fn test_family_inet6() {
        let frame = [0x00, 0x00, 0x00, 0x0a, 0x60];
        assert_eq!(decode(&frame).unwrap().family, Family::Inet6);
    }

    #[test]
    fn test_unknown_family_rejected() {
        let frame = [0x00, 0x00, 0x00, 0x63, 0x00];
        assert!(decode(&frame).is_err());
    }
}
