//! IPv4 fragment reassembly.
//!
//! Fragments are collected per (src, dst, protocol, identification) key
//! into a sparse buffer until the byte range `[0, total)` is contiguously
//! covered, where `total` comes from the fragment with the more-fragments
//! flag clear. The reassembled datagram payload is emitted exactly once
//! and the entry removed. Entries that never complete are discarded by
//! the caller-driven expiry sweep, silently, mirroring network loss.
//!
//! Overlap policy: last write wins at the byte level. This is the lenient
//! convention of classic defragmenters and of the behavior this engine
//! reproduces; it is a policy choice (stricter stacks reject overlap per
//! RFC 5722) and is confined to this module.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::protocol::ipv4::IPV4_MAX_DATAGRAM;

/// Identity of one in-progress fragmented datagram.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FragmentKey {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub protocol: u8,
    pub ident: u16,
}

/// Collection state for one datagram.
#[derive(Debug)]
struct FragmentEntry {
    /// Sparse reassembly buffer; bytes land at their fragment offset.
    data: Vec<u8>,
    /// Merged [start, end) ranges already written.
    covered: SmallVec<[(u32, u32); 4]>,
    /// Payload length learned from the final fragment.
    total_len: Option<u32>,
    first_seen_us: i64,
    last_updated_us: i64,
}

impl FragmentEntry {
    fn new(now_us: i64) -> Self {
        Self {
            data: Vec::new(),
            covered: SmallVec::new(),
            total_len: None,
            first_seen_us: now_us,
            last_updated_us: now_us,
        }
    }

    /// Merge `[start, end)` into the covered set.
    fn cover(&mut self, start: u32, end: u32) {
        self.covered.push((start, end));
        self.covered.sort_unstable();
        let mut merged: SmallVec<[(u32, u32); 4]> = SmallVec::new();
        for &(s, e) in self.covered.iter() {
            match merged.last_mut() {
                Some((_, last_end)) if s <= *last_end => *last_end = (*last_end).max(e),
                _ => merged.push((s, e)),
            }
        }
        self.covered = merged;
    }

    /// True once `[0, total)` is contiguously covered.
    fn is_complete(&self) -> bool {
        match (self.total_len, self.covered.first()) {
            (Some(total), Some(&(0, end))) => end >= total,
            _ => false,
        }
    }
}

/// Flow-keyed store for in-progress IPv4 reassembly.
#[derive(Debug, Default)]
pub struct FragmentStore {
    entries: HashMap<FragmentKey, FragmentEntry>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one fragment.
    ///
    /// `offset` is the fragment's byte offset within the original
    /// datagram payload and `more` its more-fragments flag. Returns the
    /// complete reassembled payload once all of `[0, total)` is covered,
    /// removing the entry. Fragments that would extend the datagram past
    /// the representable maximum are dropped without touching the entry.
    pub fn insert(
        &mut self,
        key: FragmentKey,
        offset: u32,
        more: bool,
        payload: &[u8],
        now_us: i64,
    ) -> Option<Vec<u8>> {
        let end = offset as usize + payload.len();
        if end > IPV4_MAX_DATAGRAM {
            trace!(?key, offset, len = payload.len(), "fragment past datagram limit, dropped");
            return None;
        }

        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| FragmentEntry::new(now_us));
        entry.last_updated_us = now_us;

        if entry.data.len() < end {
            entry.data.resize(end, 0);
        }
        entry.data[offset as usize..end].copy_from_slice(payload);
        if !payload.is_empty() {
            entry.cover(offset, end as u32);
        }

        if !more {
            entry.total_len = Some(end as u32);
        }

        if entry.is_complete() {
            let entry = self.entries.remove(&key)?;
            let total = entry.total_len? as usize;
            let mut data = entry.data;
            data.truncate(total);
            trace!(?key, total, "datagram reassembled");
            return Some(data);
        }

        None
    }

    /// Drop every entry whose last update is older than `cutoff_us`.
    ///
    /// Partially collected data is discarded with no emission; this sweep
    /// is the only bound on aggregate store growth and must be driven by
    /// the caller at a regular cadence.
    pub fn clear_expired(&mut self, cutoff_us: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_updated_us >= cutoff_us);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, cutoff_us, "expired fragment entries");
        }
        removed
    }

    /// Number of datagrams currently being collected.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> FragmentKey {
        FragmentKey {
            src: Ipv4Addr::new(10, 0, 0, 1),
            dst: Ipv4Addr::new(10, 0, 0, 2),
            protocol: 17,
            ident: 0x1234,
        }
    }

    // Test 1: two fragments, in order
    #[test]
    fn test_in_order_reassembly() {
        let mut store = FragmentStore::new();
        assert!(store.insert(key(), 0, true, b"hello ", 0).is_none());
        let out = store.insert(key(), 6, false, b"world", 1).unwrap();
        assert_eq!(out, b"hello world");
        assert!(store.is_empty());
    }

    // Test 2: arrival order does not matter
    #[test]
    fn test_out_of_order_reassembly() {
        let mut store = FragmentStore::new();
        assert!(store.insert(key(), 6, false, b"world", 0).is_none());
        let out = store.insert(key(), 0, true, b"hello ", 1).unwrap();
        assert_eq!(out, b"hello world");
    }

    // Test 3: a hole blocks completion
    #[test]
    fn test_gap_blocks_completion() {
        let mut store = FragmentStore::new();
        assert!(store.insert(key(), 0, true, b"aaaa", 0).is_none());
        // hole at [4, 8)
        assert!(store.insert(key(), 8, false, b"cccc", 1).is_none());
        assert_eq!(store.len(), 1);

        let out = store.insert(key(), 4, true, b"bbbb", 2).unwrap();
        assert_eq!(out, b"aaaabbbbcccc");
    }

    // Test 4: last write wins on overlap
    #[test]
    fn test_overlap_last_write_wins() {
        let mut store = FragmentStore::new();
        assert!(store.insert(key(), 0, true, b"XXXX", 0).is_none());
        assert!(store.insert(key(), 2, true, b"yyyy", 1).is_none());
        let out = store.insert(key(), 6, false, b"zz", 2).unwrap();
        assert_eq!(out, b"XXyyyyzz");
    }

    // Test 5: distinct keys do not interfere
    #[test]
    fn test_keys_independent() {
        let mut store = FragmentStore::new();
        let other = FragmentKey { ident: 0x9999, ..key() };

        store.insert(key(), 0, true, b"aa", 0);
        store.insert(other, 0, true, b"bb", 0);
        assert_eq!(store.len(), 2);

        let out = store.insert(other, 2, false, b"cc", 1).unwrap();
        assert_eq!(out, b"bbcc");
        assert_eq!(store.len(), 1);
    }

    // Test 6: expiry removes stale entries silently
    #[test]
    fn test_clear_expired() {
        let mut store = FragmentStore::new();
        store.insert(key(), 0, true, b"aa", 100);
        assert_eq!(store.clear_expired(100), 0); // not yet stale
        assert_eq!(store.clear_expired(101), 1);
        assert!(store.is_empty());

        // completing fragment after expiry starts a fresh entry
        assert!(store.insert(key(), 2, false, b"cc", 200).is_none());
    }

    // Test 7: oversized fragment dropped
    #[test]
    fn test_oversize_dropped() {
        let mut store = FragmentStore::new();
        let payload = vec![0u8; 100];
        assert!(store
            .insert(key(), (IPV4_MAX_DATAGRAM - 50) as u32, false, &payload, 0)
            .is_none());
        assert!(store.is_empty());
    }

    // Test 8: single unfragmented-final piece (offset 0, MF clear)
    #[test]
    fn test_single_final_fragment() {
        let mut store = FragmentStore::new();
        let out = store.insert(key(), 0, false, b"whole", 0).unwrap();
        assert_eq!(out, b"whole");
    }

    // Test 9: emitted once, then entry is gone
    #[test]
    fn test_emit_once() {
        let mut store = FragmentStore::new();
        store.insert(key(), 0, true, b"ab", 0);
        assert!(store.insert(key(), 2, false, b"cd", 1).is_some());
        // the same final fragment again only starts a new, incomplete entry
        // (offset 2 leaves [0, 2) uncovered)
        assert!(store.insert(key(), 2, false, b"cd", 2).is_none());
        assert_eq!(store.len(), 1);
    }
}
