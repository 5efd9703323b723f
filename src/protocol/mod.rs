//! Layer decoders.
//!
//! One module per protocol. Each decoder is a free
//! `decode(&[u8]) -> Result<View, LayerError>` function that validates
//! header lengths against the available bytes, extracts the fields the
//! dispatch chain needs, and exposes the next layer's bytes as a
//! borrowed payload slice. Decoders never read past the captured bytes
//! and never panic on malformed input.

pub mod ethernet;
pub mod gre;
pub mod ipv4;
pub mod ipv6;
pub mod linux_sll;
pub mod loopback;
pub mod tcp;
pub mod udp;
pub mod vlan;

pub use ethernet::EthernetView;
pub use gre::GreView;
pub use ipv4::Ipv4View;
pub use ipv6::Ipv6View;
pub use linux_sll::SllView;
pub use loopback::LoopbackView;
pub use tcp::TcpView;
pub use udp::UdpView;
pub use vlan::VlanView;
