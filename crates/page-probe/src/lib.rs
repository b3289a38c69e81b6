//! Page probe boundary.
//!
//! The probe runs inside the measured page and observes what the wire
//! never sees: paint timings, layout shifts, input responsiveness, long
//! tasks, and the page's own resource timing. Probe presence is not
//! guaranteed — a missing snapshot is a value, not an error, and every
//! consumer must tolerate it.

mod model;
mod probe;

pub use model::{
    LayoutShiftSource, LongTaskStats, PageMetrics, ResourceBreakdown, ResourceEntry, TypeCount,
};
pub use probe::{NullProbe, PageProbe, ProbeError, StaticProbe};
