//! The per-layer handler surface.
//!
//! Callers observe dissection by implementing [`LayerHandler`] and
//! passing the implementation to [`crate::Dissector::handle_frame`].
//! Every method has a default body returning [`Verdict::Continue`], so a
//! handler only overrides the layers it cares about; an absent handler
//! never blocks descent. The handler value itself carries whatever
//! caller state needs to travel with the frame through the chain.

use crate::protocol::{Ipv4View, Ipv6View, TcpView, UdpView, VlanView};

/// What the dispatch chain should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Keep descending into the remaining layers of this frame.
    #[default]
    Continue,
    /// Skip all deeper layers for this frame; sibling layers already
    /// dispatched are unaffected, and the next frame starts fresh.
    Stop,
}

/// Continuation capability handed to [`LayerHandler::on_tcp_session`].
///
/// Wraps a run of reassembled, in-order stream bytes. Calling
/// [`deliver`](Self::deliver) consumes the capability and schedules
/// exactly one [`LayerHandler::on_payload`] invocation with those bytes;
/// dropping it without calling suppresses application-layer delivery for
/// this run. At most one delivery per capability, by construction.
#[derive(Debug)]
pub struct StreamDelivery<'a> {
    bytes: &'a [u8],
    forward: &'a mut bool,
}

impl<'a> StreamDelivery<'a> {
    pub(crate) fn new(bytes: &'a [u8], forward: &'a mut bool) -> Self {
        Self { bytes, forward }
    }

    /// The reassembled bytes, valid only for the duration of the handler
    /// call; copy out anything that must outlive it.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Forward the bytes to the application-layer handler.
    pub fn deliver(self) {
        *self.forward = true;
    }
}

/// Per-layer observation hooks, invoked outer to inner as a frame is
/// dissected.
///
/// Views and byte slices borrow from the frame buffer (or, for stream
/// data, from the reassembly store) and are valid only for the duration
/// of the call.
pub trait LayerHandler {
    /// The raw link-layer frame, before any decoding below it.
    fn on_link(&mut self, frame: &[u8]) -> Verdict {
        let _ = frame;
        Verdict::Continue
    }

    /// One 802.1Q tag; called once per tag on double-tagged frames,
    /// outer tag first.
    fn on_vlan(&mut self, vlan: &VlanView<'_>) -> Verdict {
        let _ = vlan;
        Verdict::Continue
    }

    fn on_ipv4(&mut self, ipv4: &Ipv4View<'_>) -> Verdict {
        let _ = ipv4;
        Verdict::Continue
    }

    fn on_ipv6(&mut self, ipv6: &Ipv6View<'_>) -> Verdict {
        let _ = ipv6;
        Verdict::Continue
    }

    /// The GRE payload about to be re-dissected as an inner packet.
    fn on_gre(&mut self, payload: &[u8]) -> Verdict {
        let _ = payload;
        Verdict::Continue
    }

    fn on_tcp(&mut self, tcp: &TcpView<'_>) -> Verdict {
        let _ = tcp;
        Verdict::Continue
    }

    fn on_udp(&mut self, udp: &UdpView<'_>) -> Verdict {
        let _ = udp;
        Verdict::Continue
    }

    /// A run of reassembled in-order stream bytes for this segment's
    /// flow. The default implementation forwards the run to
    /// [`on_payload`](Self::on_payload), so stream data flows through
    /// unless a handler intervenes.
    fn on_tcp_session(&mut self, tcp: &TcpView<'_>, stream: StreamDelivery<'_>) -> Verdict {
        let _ = tcp;
        stream.deliver();
        Verdict::Continue
    }

    /// Application-layer bytes: a transport payload, or a reassembled
    /// stream run forwarded by `on_tcp_session`.
    fn on_payload(&mut self, payload: &[u8]) -> Verdict {
        let _ = payload;
        Verdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl LayerHandler for Noop {}

    #[test]
    fn test_defaults_continue() {
        let mut h = Noop;
        assert_eq!(h.on_link(&[1, 2, 3]), Verdict::Continue);
        assert_eq!(h.on_payload(&[]), Verdict::Continue);
    }

    #[test]
    fn test_default_session_handler_delivers() {
        let mut h = Noop;
        let mut forward = false;
        let mut hdr = [0u8; 20];
        hdr[12] = 0x50; // data offset 5
        let tcp = crate::protocol::tcp::decode(&hdr).unwrap();

        h.on_tcp_session(&tcp, StreamDelivery::new(b"abc", &mut forward));
        assert!(forward);
    }

    #[test]
    fn test_delivery_dropped_without_call() {
        let mut forward = false;
        {
            let d = StreamDelivery::new(b"abc", &mut forward);
            assert_eq!(d.bytes(), b"abc");
            // dropped here without deliver()
        }
        assert!(!forward);
    }
}
