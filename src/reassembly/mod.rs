//! Flow-keyed reassembly state.
//!
//! Two stores: IPv4 fragment collection and TCP stream ordering. Both
//! buffer out-of-order data keyed by flow identity, bound memory
//! per flow, and rely on the caller-driven [`clear_expired`] sweeps for
//! aggregate bounds — time enters only through arguments, never from a
//! clock, so eviction is testable without real elapsed time.
//!
//! [`clear_expired`]: FragmentStore::clear_expired

mod fragments;
mod stream;

pub use fragments::{FragmentKey, FragmentStore};
pub use stream::{StreamKey, StreamStore, MAX_PENDING_BYTES};
