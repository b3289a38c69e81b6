use serde::{Deserialize, Serialize};

/// One snapshot of everything the in-page observers collected.
///
/// Every timing is nullable: absence means "not observed" (the page may
/// never paint an LCP candidate, the user may never interact), which is
/// meaningful on its own and must survive into the report.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub ttfb: Option<f64>,
    pub fcp: Option<f64>,
    pub lcp: Option<f64>,
    pub inp: Option<f64>,
    pub cls: Option<f64>,
    pub dom_content_loaded: Option<f64>,
    pub load: Option<f64>,
    /// Short description of the LCP element (tag plus id/class hint).
    pub lcp_element: Option<String>,
    pub cls_sources: Vec<LayoutShiftSource>,
    pub long_tasks: LongTaskStats,
    /// Individual interaction durations in ms, unordered.
    pub interaction_durations: Vec<f64>,
    /// Resource-timing view from inside the page, when available.
    pub resources: Option<ResourceBreakdown>,
}

/// One element that contributed layout shift.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutShiftSource {
    pub selector: String,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTaskStats {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

/// Resource-timing rollup as the page itself observed it. Byte counts
/// are unavailable from resource timing, so entries carry durations
/// only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBreakdown {
    pub by_type: Vec<TypeCount>,
    pub slowest: Vec<ResourceEntry>,
    pub largest: Vec<ResourceEntry>,
    pub third_party_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub kind: String,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    pub url: String,
    pub duration_ms: f64,
}
