//! Fuzz target for the whole dissection chain.
//!
//! Every configured link type is driven over the same arbitrary bytes,
//! with TCP reassembly enabled so the stream store sees hostile
//! sequence numbers too. The safety contract under test: no panic, no
//! out-of-bounds access, for any input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pcap_layers::{Dissector, FrameHeader, LayerHandler, Verdict};

struct Sink;

impl LayerHandler for Sink {
    fn on_payload(&mut self, payload: &[u8]) -> Verdict {
        // Touch the bytes so payload views are actually materialized
        let _ = payload.iter().fold(0u8, |a, b| a.wrapping_add(*b));
        Verdict::Continue
    }
}

fuzz_target!(|data: &[u8]| {
    let header = FrameHeader::full(0, data.len() as u32);

    for dlt in [0u16, 1, 101, 108, 113] {
        let mut dissector = match Dissector::new(dlt, true) {
            Ok(d) => d,
            Err(_) => continue,
        };
        dissector.handle_frame(&header, data, &mut Sink);
        dissector.clear_expired(i64::MAX);
    }
});
