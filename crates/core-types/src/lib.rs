//! Shared primitives for the loadscope measurement crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of the execution context under measurement.
///
/// Targets are handed to us by the inspector link; the engine never
/// interprets the contents beyond equality and hashing.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TargetId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier correlating the four network event kinds for one request.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl From<&str> for RequestId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session options, immutable for the session lifetime.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub cold_load: bool,
    pub trace_enabled: bool,
}

/// A best-effort step that did not go to plan.
///
/// Degradations never fail a session; they accumulate on it and ride
/// along on the final report so callers can see which parts of the
/// measurement ran at reduced fidelity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Degradation {
    TraceStartFailed,
    ColdReloadFellBack,
    ColdReloadUnavailable,
    ProbeStartFailed,
    ProbeSnapshotFailed,
    ProbeStopFailed,
    TraceFlushTimedOut,
    PageInfoUnavailable,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Degradation::TraceStartFailed => "trace-start-failed",
            Degradation::ColdReloadFellBack => "cold-reload-fell-back",
            Degradation::ColdReloadUnavailable => "cold-reload-unavailable",
            Degradation::ProbeStartFailed => "probe-start-failed",
            Degradation::ProbeSnapshotFailed => "probe-snapshot-failed",
            Degradation::ProbeStopFailed => "probe-stop-failed",
            Degradation::TraceFlushTimedOut => "trace-flush-timed-out",
            Degradation::PageInfoUnavailable => "page-info-unavailable",
        };
        f.write_str(label)
    }
}
