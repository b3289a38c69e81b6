use chrono::{DateTime, Utc};
use loadscope_core_types::Degradation;
use network_rollup::{CategoryRollup, FailureRecord, SlowRequest};
use page_probe::{LayoutShiftSource, LongTaskStats};
use serde::{Deserialize, Serialize};

/// Complete result of one measurement session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub meta: ReportMeta,
    pub timings: Timings,
    pub long_tasks: LongTaskStats,
    pub network: NetworkReport,
    pub lcp_element: Option<String>,
    /// Largest layout-shift contributors, descending, at most 5.
    pub cls_sources: Vec<LayoutShiftSource>,
    /// Slowest interactions in ms, descending, at most 10.
    pub interaction_durations: Vec<f64>,
    pub insights: Vec<Insight>,
    pub trace: TraceReport,
    /// Best-effort steps that ran at reduced fidelity. Informational;
    /// never invalidates the report.
    pub diagnostics: Vec<Degradation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub url: Option<String>,
    pub origin: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub cold_load: bool,
    pub trace_enabled: bool,
}

/// Page-sourced timings, all in ms except `cls` (unitless score).
/// `None` means "not observed", which is a valid outcome.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    pub ttfb: Option<f64>,
    pub fcp: Option<f64>,
    pub lcp: Option<f64>,
    pub inp: Option<f64>,
    pub cls: Option<f64>,
    pub dom_content_loaded: Option<f64>,
    pub load: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReport {
    pub requests_total: u64,
    pub transferred_bytes: u64,
    pub cache_hit_rate: Option<f64>,
    pub failures: Vec<FailureRecord>,
    pub by_domain: Vec<DomainEntry>,
    pub by_type: Vec<CategoryRollup>,
    pub slowest: Vec<SlowRequest>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntry {
    pub domain: String,
    pub requests: u64,
    pub bytes: u64,
    pub third_party: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceReport {
    pub captured: bool,
    pub size_bytes: u64,
    pub fragments: u64,
    /// Opaque handle to the captured buffer; `None` when nothing was
    /// captured.
    pub reference: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Good,
    NeedsImprovement,
    Poor,
}

/// One qualitative finding derived from the report.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

impl Insight {
    pub fn new(code: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
        }
    }
}
