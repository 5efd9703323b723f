//! TCP stream reassembly.
//!
//! Each direction of a TCP conversation is its own stream, keyed by the
//! full (src, src port, dst, dst port) tuple. A stream tracks the next
//! expected sequence number and buffers segments that arrive ahead of
//! it; in-order data, plus any buffered data it makes contiguous, is
//! handed back for delivery immediately.
//!
//! Overlap policy: data at or behind the expected sequence has its
//! overlapping prefix discarded and only the novel tail is kept. This is
//! lenient, best-effort extraction — adequate for payload recovery, not
//! a canonical reconstruction for evasion-sensitive intrusion detection.
//!
//! All sequence arithmetic is modulo 2^32: comparisons go through the
//! `seq_lt`/`seq_add` wrapping helpers, never raw magnitude.

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use tracing::{debug, trace};

/// Upper bound on buffered out-of-order bytes per stream; segments that
/// would exceed it are dropped.
pub const MAX_PENDING_BYTES: usize = 256 * 1024;

/// One direction of a TCP conversation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct StreamKey {
    pub src: IpAddr,
    pub src_port: u16,
    pub dst: IpAddr,
    pub dst_port: u16,
}

#[derive(Debug)]
struct StreamEntry {
    /// Next expected sequence number.
    next_seq: u32,
    /// Segments ahead of `next_seq`, keyed by sequence number.
    pending: BTreeMap<u32, Vec<u8>>,
    pending_bytes: usize,
    last_updated_us: i64,
}

impl StreamEntry {
    fn new(next_seq: u32, now_us: i64) -> Self {
        Self {
            next_seq,
            pending: BTreeMap::new(),
            pending_bytes: 0,
            last_updated_us: now_us,
        }
    }

    /// Append in-order data and drain any pending segments it unblocks.
    fn advance(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        out.extend_from_slice(data);
        self.next_seq = seq_add(self.next_seq, data.len());

        loop {
            // Pending segments the expected sequence has moved past:
            // drop fully covered ones, keep the novel tail of partial
            // overlaps.
            let behind: Vec<u32> = self
                .pending
                .keys()
                .copied()
                .filter(|&s| seq_lt(s, self.next_seq))
                .collect();

            let mut advanced = false;
            for seq in behind {
                if let Some(seg) = self.pending.remove(&seq) {
                    self.pending_bytes -= seg.len();
                    let end = seq_add(seq, seg.len());
                    if seq_lt(self.next_seq, end) {
                        let skip = self.next_seq.wrapping_sub(seq) as usize;
                        out.extend_from_slice(&seg[skip..]);
                        self.next_seq = end;
                        advanced = true;
                    }
                }
            }

            if let Some(seg) = self.pending.remove(&self.next_seq) {
                self.pending_bytes -= seg.len();
                self.next_seq = seq_add(self.next_seq, seg.len());
                out.extend_from_slice(&seg);
                advanced = true;
            }

            if !advanced {
                break;
            }
        }

        out
    }
}

/// Flow-keyed store for in-progress TCP streams.
#[derive(Debug, Default)]
pub struct StreamStore {
    entries: HashMap<StreamKey, StreamEntry>,
}

impl StreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one segment.
    ///
    /// The first segment observed for a flow establishes the expected
    /// sequence number (a SYN consumes one sequence slot). Returns the
    /// run of bytes that became contiguous, if any; the caller delivers
    /// it and must copy out anything it keeps.
    pub fn insert(
        &mut self,
        key: StreamKey,
        seq: u32,
        syn: bool,
        payload: &[u8],
        now_us: i64,
    ) -> Option<Vec<u8>> {
        let initial = if syn { seq.wrapping_add(1) } else { seq };
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| StreamEntry::new(initial, now_us));
        entry.last_updated_us = now_us;

        if payload.is_empty() {
            return None;
        }

        let data_seq = if syn { seq.wrapping_add(1) } else { seq };

        // Trim the already-delivered prefix of a late or overlapping
        // segment; a pure retransmission vanishes entirely.
        let (seq, payload) = if seq_lt(data_seq, entry.next_seq) {
            let overlap = entry.next_seq.wrapping_sub(data_seq) as usize;
            if overlap >= payload.len() {
                trace!(?key, seq = data_seq, "retransmitted segment discarded");
                return None;
            }
            (entry.next_seq, &payload[overlap..])
        } else {
            (data_seq, payload)
        };

        if seq == entry.next_seq {
            let run = entry.advance(payload);
            trace!(?key, len = run.len(), "stream advanced");
            return Some(run);
        }

        // Ahead of the window: buffer, bounded per stream. A duplicate
        // sequence number replaces the earlier segment.
        let replaced = entry.pending.get(&seq).map(Vec::len).unwrap_or(0);
        if entry.pending_bytes - replaced + payload.len() > MAX_PENDING_BYTES {
            trace!(?key, seq, "pending buffer full, segment dropped");
            return None;
        }
        if let Some(old) = entry.pending.insert(seq, payload.to_vec()) {
            entry.pending_bytes -= old.len();
        }
        entry.pending_bytes += payload.len();
        None
    }

    /// Remove a stream, discarding anything still buffered. Used on
    /// FIN/RST teardown.
    pub fn remove(&mut self, key: &StreamKey) {
        if self.entries.remove(key).is_some() {
            trace!(?key, "stream closed");
        }
    }

    /// Drop every stream whose last update is older than `cutoff_us`.
    /// Buffered out-of-order data is discarded without delivery.
    pub fn clear_expired(&mut self, cutoff_us: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_updated_us >= cutoff_us);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, cutoff_us, "expired stream entries");
        }
        removed
    }

    /// Number of streams currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// True if `a` precedes `b` in sequence space, window-relative.
#[inline]
fn seq_lt(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Advance a sequence number by `n` bytes, modulo 2^32.
#[inline]
fn seq_add(a: u32, n: usize) -> u32 {
    a.wrapping_add(n as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn key() -> StreamKey {
        StreamKey {
            src: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            src_port: 51000,
            dst: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2)),
            dst_port: 80,
        }
    }

    // Test 1: in-order segments flush immediately
    #[test]
    fn test_in_order_delivery() {
        let mut store = StreamStore::new();
        assert_eq!(store.insert(key(), 1000, false, b"hello", 0).unwrap(), b"hello");
        assert_eq!(store.insert(key(), 1005, false, b" world", 1).unwrap(), b" world");
    }

    // Test 2: out-of-order gap fill yields one contiguous run
    #[test]
    fn test_gap_fill_single_run() {
        let mut store = StreamStore::new();
        assert_eq!(store.insert(key(), 1000, false, b"aa", 0).unwrap(), b"aa");
        // ahead by 2: buffered
        assert!(store.insert(key(), 1004, false, b"cc", 1).is_none());
        // gap filled: both runs come out together, no duplicate of "aa"
        assert_eq!(store.insert(key(), 1002, false, b"bb", 2).unwrap(), b"bbcc");
    }

    // Test 3: pure retransmission is discarded
    #[test]
    fn test_retransmit_discarded() {
        let mut store = StreamStore::new();
        store.insert(key(), 1000, false, b"hello", 0);
        assert!(store.insert(key(), 1000, false, b"hello", 1).is_none());
    }

    // Test 4: partial overlap keeps only the novel tail
    #[test]
    fn test_overlap_trimmed() {
        let mut store = StreamStore::new();
        store.insert(key(), 1000, false, b"hello", 0);
        assert_eq!(store.insert(key(), 1003, false, b"loWORLD", 1).unwrap(), b"WORLD");
    }

    // Test 5: sequence wraparound across 2^32
    #[test]
    fn test_sequence_wraparound() {
        let mut store = StreamStore::new();
        let near_max = u32::MAX - 2;
        assert_eq!(store.insert(key(), near_max, false, b"ABC", 0).unwrap(), b"ABC");
        // next_seq wrapped to 0; a segment at 3 is "ahead", not "behind"
        assert!(store.insert(key(), 3, false, b"GHI", 1).is_none());
        assert_eq!(store.insert(key(), 0, false, b"DEF", 2).unwrap(), b"DEFGHI");
    }

    // Test 6: SYN consumes one sequence number
    #[test]
    fn test_syn_consumes_sequence() {
        let mut store = StreamStore::new();
        assert!(store.insert(key(), 999, true, b"", 0).is_none());
        assert_eq!(store.insert(key(), 1000, false, b"data", 1).unwrap(), b"data");
    }

    // Test 7: directions are independent streams
    #[test]
    fn test_directions_independent() {
        let reverse = StreamKey {
            src: key().dst,
            src_port: key().dst_port,
            dst: key().src,
            dst_port: key().src_port,
        };
        let mut store = StreamStore::new();
        assert_eq!(store.insert(key(), 10, false, b"req", 0).unwrap(), b"req");
        assert_eq!(store.insert(reverse, 900, false, b"resp", 1).unwrap(), b"resp");
        assert_eq!(store.len(), 2);
    }

    // Test 8: expiry drops buffered data without delivery
    #[test]
    fn test_clear_expired() {
        let mut store = StreamStore::new();
        store.insert(key(), 1000, false, b"aa", 100);
        store.insert(key(), 1010, false, b"cc", 100); // buffered, gap before it
        assert_eq!(store.clear_expired(101), 1);
        assert!(store.is_empty());
    }

    // Test 9: pending cap drops further out-of-order segments
    #[test]
    fn test_pending_cap() {
        let mut store = StreamStore::new();
        store.insert(key(), 0, false, b"x", 0);
        let big = vec![0u8; MAX_PENDING_BYTES];
        assert!(store.insert(key(), 100, false, &big, 1).is_none()); // buffered, at cap
        // adjacent to the buffered run, but over the cap: dropped
        let next = 100 + MAX_PENDING_BYTES as u32;
        assert!(store.insert(key(), next, false, b"y", 2).is_none());
        // filling the gap flushes exactly the capped segment, nothing more
        let run = store.insert(key(), 1, false, &[1u8; 99], 3).unwrap();
        assert_eq!(run.len(), 99 + MAX_PENDING_BYTES);
    }

    // Test 10: duplicate ahead-of-window sequence replaces the old bytes
    #[test]
    fn test_pending_replacement() {
        let mut store = StreamStore::new();
        store.insert(key(), 0, false, b"a", 0);
        assert!(store.insert(key(), 5, false, b"OLD!", 1).is_none());
        assert!(store.insert(key(), 5, false, b"NEW!", 2).is_none());
        let run = store.insert(key(), 1, false, b"bbbb", 3).unwrap();
        assert_eq!(run, b"bbbbNEW!");
    }

    // Test 11: explicit removal discards state
    #[test]
    fn test_remove() {
        let mut store = StreamStore::new();
        store.insert(key(), 0, false, b"a", 0);
        store.remove(&key());
        assert!(store.is_empty());
        // re-learned from scratch afterwards
        assert_eq!(store.insert(key(), 500, false, b"z", 1).unwrap(), b"z");
    }
}
