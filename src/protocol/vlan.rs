//! IEEE 802.1Q VLAN tag decoder.

use crate::error::{DecodeResult, LayerError};
use crate::protocol::ethernet::ethertype;
use crate::wire;

/// Bytes consumed per tag once the TPID has been read by the outer layer:
/// TCI (2) plus the inner EtherType (2).
pub const VLAN_TAG_LEN: usize = 4;

/// Decoded 802.1Q tag.
#[derive(Debug, Clone, Copy)]
pub struct VlanView<'a> {
    /// VLAN identifier (12 bits).
    pub vlan_id: u16,
    /// Priority code point (3 bits).
    pub priority: u8,
    /// Drop eligible indicator.
    pub dei: bool,
    /// EtherType of the encapsulated protocol (may be another tag).
    pub inner_ethertype: u16,
    pub payload: &'a [u8],
}

/// True if `etype` announces an 802.1Q/802.1ad tag.
pub fn is_vlan_ethertype(etype: u16) -> bool {
    matches!(
        etype,
        ethertype::VLAN | ethertype::QINQ | ethertype::QINQ_OLD
    )
}

/// Decode one VLAN tag. The TPID was consumed by the enclosing layer, so
/// `data` starts at the TCI.
pub fn decode(data: &[u8]) -> DecodeResult<VlanView<'_>> {
    if data.len() < VLAN_TAG_LEN {
        return Err(LayerError::PacketTooShort {
            layer: "vlan",
            needed: VLAN_TAG_LEN,
            have: data.len(),
        });
    }

    let tci = wire::read_u16(data, 0);

    Ok(VlanView {
        vlan_id: tci & 0x0FFF,
        priority: ((tci >> 13) & 0x07) as u8,
        dei: (tci >> 12) & 0x01 != 0,
        inner_ethertype: wire::read_u16(data, 2),
        payload: &data[VLAN_TAG_LEN..],
    })
}
