//! Per-session network aggregation.
//!
//! [`NetworkState`] turns the unordered stream of link events for one
//! target into running totals, per-domain and per-category rollups,
//! failure records, and a trace fragment buffer. The state is owned
//! exclusively by its session; [`NetworkState::snapshot`] projects it
//! into the immutable [`NetworkSnapshot`] consumed by report assembly.

mod events;
mod snapshot;
mod state;

pub use events::NetEvent;
pub use snapshot::{
    CategoryRollup, DomainRollup, FailureRecord, NetworkSnapshot, SlowRequest, TraceStats,
    SLOWEST_CAP,
};
pub use state::{NetworkState, PendingRequest};
