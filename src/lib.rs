//! # pcap-layers
//!
//! Layered dissection of captured network frames.
//!
//! Given one raw frame as delivered by a packet-capture source, a
//! [`Dissector`] walks it through its nested protocol encapsulations —
//! link layer, VLAN tags, IPv4/IPv6, GRE tunnels, TCP/UDP — and invokes
//! a caller-supplied [`LayerHandler`] at every layer boundary, down to
//! the application payload. Fragmented IPv4 datagrams and out-of-order
//! TCP segments are reconstructed by flow-keyed reassembly stores before
//! the inner layers are dispatched.
//!
//! Packet bytes are untrusted input: every header field is read through
//! bounds-checked accessors, truncated or malformed content ends descent
//! for that frame without affecting anything else, and nothing here ever
//! panics on wire data.
//!
//! ## Quick start
//!
//! ```rust
//! use pcap_layers::{Dissector, FrameHeader, LayerHandler, Verdict};
//!
//! struct PayloadSink {
//!     bytes_seen: usize,
//! }
//!
//! impl LayerHandler for PayloadSink {
//!     fn on_payload(&mut self, payload: &[u8]) -> Verdict {
//!         self.bytes_seen += payload.len();
//!         Verdict::Continue
//!     }
//! }
//!
//! // DLT 1 = Ethernet; enable TCP stream reassembly
//! let mut dissector = Dissector::new(1, true).unwrap();
//! let mut sink = PayloadSink { bytes_seen: 0 };
//!
//! // For each frame the capture source hands over:
//! let header = FrameHeader::full(1_700_000_000_000_000, 60);
//! dissector.handle_frame(&header, &[0u8; 60], &mut sink);
//!
//! // Periodically, with a cutoff derived from frame timestamps:
//! dissector.clear_expired(1_700_000_000_000_000 - 30_000_000);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                          pcap-layers                             |
//! +------------------------------------------------------------------+
//! |  wire        - unaligned big-endian byte accessors               |
//! |  frame       - capture header, truncation clamp                  |
//! |  protocol/   - one bounds-checked decoder per layer              |
//! |  handler     - LayerHandler trait, Verdict, StreamDelivery       |
//! |  reassembly/ - IPv4 fragment store, TCP stream store             |
//! |  dissector   - engine instance and dispatch chain                |
//! |  error       - config errors vs. per-layer rejections            |
//! +------------------------------------------------------------------+
//! ```
//!
//! Frame acquisition is out of scope: pair this crate with a pcap file
//! or live-capture reader that supplies `(FrameHeader, &[u8])` pairs.

pub mod error;
pub mod frame;
pub mod handler;
pub mod protocol;
pub mod reassembly;
pub mod wire;

mod dissector;

pub use dissector::{Dissector, LinkType, MAX_TUNNEL_DEPTH};
pub use error::{DecodeResult, Error, LayerError};
pub use frame::FrameHeader;
pub use handler::{LayerHandler, StreamDelivery, Verdict};
pub use protocol::{
    EthernetView, GreView, Ipv4View, Ipv6View, LoopbackView, SllView, TcpView, UdpView, VlanView,
};
pub use reassembly::{FragmentKey, FragmentStore, StreamKey, StreamStore};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
