//! The run report: the one artifact that crosses the core/UI boundary.
//!
//! [`assemble`] is a pure merge of two independently-collected
//! snapshots (page probe, network rollup) plus session metadata; the
//! result is immutable and fully self-describing. [`derive_insights`]
//! evaluates a fixed, ordered rule table over the assembled report.
//!
//! The serialized form is the export file format: camelCase, stable
//! schema, new fields optional-only.

mod assemble;
mod insight;
mod model;
pub mod thresholds;

pub use assemble::{assemble, SessionMeta};
pub use insight::{derive_insights, derive_insights_with};
pub use model::{
    DomainEntry, Insight, NetworkReport, ReportMeta, RunReport, Severity, Timings, TraceReport,
};
pub use thresholds::Thresholds;
