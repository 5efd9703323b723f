//! The dissection engine: configuration, per-frame entry point, and the
//! dispatch chain connecting decoders, reassembly stores, and handlers.

use std::net::IpAddr;

use tracing::trace;

use crate::error::{DecodeResult, Error, LayerError};
use crate::frame::FrameHeader;
use crate::handler::{LayerHandler, StreamDelivery, Verdict};
use crate::protocol::ethernet::{self, ethertype};
use crate::protocol::ipv4::{self, ip_protocol};
use crate::protocol::loopback::Family;
use crate::protocol::{gre, ipv6, linux_sll, loopback, tcp, udp, vlan};
use crate::reassembly::{FragmentKey, FragmentStore, StreamKey, StreamStore};

/// Nested-tunnel recursion cap: at most this many GRE levels are entered
/// before descent halts, so adversarial nesting cannot recurse unboundedly.
pub const MAX_TUNNEL_DEPTH: u8 = 2;

/// Supported link-layer variants, selected once at configuration time by
/// the capture source's datalink type value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// BSD NULL (DLT 0): 4-byte host-order address family.
    Null,
    /// Ethernet II (DLT 1).
    Ethernet,
    /// Raw IP, no link header (DLT 12 / LINKTYPE 101).
    Raw,
    /// OpenBSD LOOP (DLT 108): 4-byte big-endian address family.
    Loop,
    /// Linux cooked capture (DLT 113).
    LinuxSll,
}

impl LinkType {
    /// Map a capture datalink-type value to a supported variant.
    pub fn from_dlt(dlt: u16) -> Option<Self> {
        match dlt {
            0 => Some(LinkType::Null),
            1 => Some(LinkType::Ethernet),
            12 | 101 => Some(LinkType::Raw),
            108 => Some(LinkType::Loop),
            113 => Some(LinkType::LinuxSll),
            _ => None,
        }
    }
}

/// A layered packet dissection engine.
///
/// One instance owns its configuration and all reassembly state; nothing
/// is process-global, so independent instances (one per capture source)
/// never interfere. Execution is strictly synchronous: each
/// [`handle_frame`](Self::handle_frame) call fully dissects one frame,
/// including reassembly-store interaction and every nested handler
/// invocation, before returning. Concurrent use requires one instance
/// per thread or external serialization.
///
/// Buffered reassembly state is bounded per flow but not in aggregate;
/// callers must invoke [`clear_expired`](Self::clear_expired) at a
/// regular cadence (e.g. once per batch of frames) with a monotonically
/// advancing cutoff derived from frame timestamps.
#[derive(Debug)]
pub struct Dissector {
    link_type: LinkType,
    reassemble_tcp: bool,
    fragments: FragmentStore,
    streams: StreamStore,
}

impl Dissector {
    /// Create an engine for the given datalink type.
    ///
    /// `reassemble_tcp` toggles the TCP stream store; when off, TCP
    /// payloads are delivered per segment without reordering. Fails if
    /// `link_type` names an unsupported datalink value.
    pub fn new(link_type: u16, reassemble_tcp: bool) -> Result<Self, Error> {
        let link_type =
            LinkType::from_dlt(link_type).ok_or(Error::UnsupportedLinkType { link_type })?;
        Ok(Self {
            link_type,
            reassemble_tcp,
            fragments: FragmentStore::new(),
            streams: StreamStore::new(),
        })
    }

    /// The configured link-layer variant.
    pub fn link_type(&self) -> LinkType {
        self.link_type
    }

    /// Dissect one captured frame, invoking `handler` at each decoded
    /// layer boundary.
    ///
    /// Reads at most `min(header.cap_len, data.len())` bytes regardless
    /// of any declared length. Malformed or truncated content ends
    /// descent for this frame only; it is never an error to the caller.
    pub fn handle_frame<H: LayerHandler>(
        &mut self,
        header: &FrameHeader,
        data: &[u8],
        handler: &mut H,
    ) {
        let captured = (header.cap_len as usize).min(data.len());
        let frame = &data[..captured];

        if let Err(err) = self.dispatch_link(frame, header.timestamp_us, handler) {
            trace!(%err, "descent halted");
        }
    }

    /// Expire reassembly state older than `cutoff_us` from both stores.
    /// Partially collected fragments and buffered segments are discarded
    /// without any handler invocation.
    pub fn clear_expired(&mut self, cutoff_us: i64) {
        self.fragments.clear_expired(cutoff_us);
        self.streams.clear_expired(cutoff_us);
    }

    fn dispatch_link<H: LayerHandler>(
        &mut self,
        frame: &[u8],
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        // The link header is validated before the link handler runs, so
        // a frame too short for its own link layer invokes nothing.
        match self.link_type {
            LinkType::Ethernet => {
                let eth = ethernet::decode(frame)?;
                if handler.on_link(frame) == Verdict::Stop {
                    return Ok(());
                }
                self.dispatch_ethertype(eth.ethertype, eth.payload, ts_us, handler)
            }
            LinkType::LinuxSll => {
                let sll = linux_sll::decode(frame)?;
                if handler.on_link(frame) == Verdict::Stop {
                    return Ok(());
                }
                self.dispatch_ethertype(sll.protocol, sll.payload, ts_us, handler)
            }
            LinkType::Null | LinkType::Loop => {
                let lo = loopback::decode(frame)?;
                if handler.on_link(frame) == Verdict::Stop {
                    return Ok(());
                }
                match lo.family {
                    Family::Inet => self.dispatch_ipv4(lo.payload, 0, ts_us, handler),
                    Family::Inet6 => self.dispatch_ipv6(lo.payload, 0, ts_us, handler),
                }
            }
            LinkType::Raw => {
                let version = frame.first().map(|b| b >> 4);
                if !matches!(version, Some(4) | Some(6)) {
                    return Err(LayerError::InvalidField {
                        layer: "raw",
                        field: "version",
                        value: version.unwrap_or(0) as u64,
                    });
                }
                if handler.on_link(frame) == Verdict::Stop {
                    return Ok(());
                }
                match version {
                    Some(4) => self.dispatch_ipv4(frame, 0, ts_us, handler),
                    _ => self.dispatch_ipv6(frame, 0, ts_us, handler),
                }
            }
        }
    }

    /// Route by EtherType, unwinding any run of VLAN tags first.
    fn dispatch_ethertype<H: LayerHandler>(
        &mut self,
        mut etype: u16,
        mut data: &[u8],
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        // Tags may nest (802.1ad QinQ); each one is announced to the
        // handler in outer-to-inner order before IP decoding begins.
        while vlan::is_vlan_ethertype(etype) {
            let tag = vlan::decode(data)?;
            if handler.on_vlan(&tag) == Verdict::Stop {
                return Ok(());
            }
            etype = tag.inner_ethertype;
            data = tag.payload;
        }

        match etype {
            ethertype::IPV4 => self.dispatch_ipv4(data, 0, ts_us, handler),
            ethertype::IPV6 => self.dispatch_ipv6(data, 0, ts_us, handler),
            _ => Ok(()),
        }
    }

    fn dispatch_ipv4<H: LayerHandler>(
        &mut self,
        data: &[u8],
        depth: u8,
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        let ip = ipv4::decode(data)?;
        if handler.on_ipv4(&ip) == Verdict::Stop {
            return Ok(());
        }

        if ip.is_fragment() {
            let key = FragmentKey {
                src: ip.src,
                dst: ip.dst,
                protocol: ip.protocol,
                ident: ip.identification,
            };
            // Collect; only a completed datagram continues downward, as
            // if it had arrived unfragmented.
            if let Some(datagram) = self.fragments.insert(
                key,
                ip.fragment_offset,
                ip.more_fragments,
                ip.payload,
                ts_us,
            ) {
                return self.dispatch_transport(
                    ip.protocol,
                    IpAddr::V4(ip.src),
                    IpAddr::V4(ip.dst),
                    &datagram,
                    depth,
                    ts_us,
                    handler,
                );
            }
            return Ok(());
        }

        self.dispatch_transport(
            ip.protocol,
            IpAddr::V4(ip.src),
            IpAddr::V4(ip.dst),
            ip.payload,
            depth,
            ts_us,
            handler,
        )
    }

    fn dispatch_ipv6<H: LayerHandler>(
        &mut self,
        data: &[u8],
        depth: u8,
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        let ip = ipv6::decode(data)?;
        if handler.on_ipv6(&ip) == Verdict::Stop {
            return Ok(());
        }

        self.dispatch_transport(
            ip.protocol,
            IpAddr::V6(ip.src),
            IpAddr::V6(ip.dst),
            ip.payload,
            depth,
            ts_us,
            handler,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_transport<H: LayerHandler>(
        &mut self,
        protocol: u8,
        src: IpAddr,
        dst: IpAddr,
        data: &[u8],
        depth: u8,
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        match protocol {
            ip_protocol::TCP => self.dispatch_tcp(src, dst, data, ts_us, handler),
            ip_protocol::UDP => self.dispatch_udp(data, handler),
            ip_protocol::GRE => self.dispatch_gre(data, depth, ts_us, handler),
            _ => Ok(()),
        }
    }

    fn dispatch_gre<H: LayerHandler>(
        &mut self,
        data: &[u8],
        depth: u8,
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        let gre = gre::decode(data)?;
        if handler.on_gre(gre.payload) == Verdict::Stop {
            return Ok(());
        }

        if depth >= MAX_TUNNEL_DEPTH {
            return Err(LayerError::TunnelTooDeep {
                max: MAX_TUNNEL_DEPTH,
            });
        }

        match gre.protocol {
            ethertype::IPV4 => self.dispatch_ipv4(gre.payload, depth + 1, ts_us, handler),
            ethertype::IPV6 => self.dispatch_ipv6(gre.payload, depth + 1, ts_us, handler),
            _ => Ok(()),
        }
    }

    fn dispatch_udp<H: LayerHandler>(&mut self, data: &[u8], handler: &mut H) -> DecodeResult<()> {
        let udp = udp::decode(data)?;
        if handler.on_udp(&udp) == Verdict::Stop {
            return Ok(());
        }

        handler.on_payload(udp.payload);
        Ok(())
    }

    fn dispatch_tcp<H: LayerHandler>(
        &mut self,
        src: IpAddr,
        dst: IpAddr,
        data: &[u8],
        ts_us: i64,
        handler: &mut H,
    ) -> DecodeResult<()> {
        let tcp = tcp::decode(data)?;
        if handler.on_tcp(&tcp) == Verdict::Stop {
            return Ok(());
        }

        if !self.reassemble_tcp {
            handler.on_payload(tcp.payload);
            return Ok(());
        }

        let key = StreamKey {
            src,
            src_port: tcp.src_port,
            dst,
            dst_port: tcp.dst_port,
        };

        if let Some(run) = self.streams.insert(key, tcp.seq, tcp.syn(), tcp.payload, ts_us) {
            let mut forward = false;
            let verdict = handler.on_tcp_session(&tcp, StreamDelivery::new(&run, &mut forward));
            // Stop-descent outranks a scheduled delivery: the
            // application layer is below the session layer.
            if forward && verdict == Verdict::Continue {
                handler.on_payload(&run);
            }
        }

        // Teardown frees the flow's buffered state; a new conversation
        // on the same tuple starts from scratch.
        if tcp.fin() || tcp.rst() {
            self.streams.remove(&key);
        }

        Ok(())
    }
}
