use domain_classify::ResourceCategory;
use serde::{Deserialize, Serialize};

/// Slowest-request list cap.
pub const SLOWEST_CAP: usize = 10;

/// Immutable projection of one session's accumulated network state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub requests_total: u64,
    pub transferred_bytes: u64,
    pub cache_hits: u64,
    /// Absent (not zero) when no requests were observed.
    pub cache_hit_rate: Option<f64>,
    /// Failures in arrival order.
    pub failures: Vec<FailureRecord>,
    /// Sorted by bytes descending, ties in first-seen order.
    pub by_domain: Vec<DomainRollup>,
    /// Sorted by bytes descending.
    pub by_type: Vec<CategoryRollup>,
    /// Top finished requests by duration descending, at most
    /// [`SLOWEST_CAP`], ties in event order.
    pub slowest: Vec<SlowRequest>,
    pub trace: TraceStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub url: String,
    pub error: String,
    pub category: ResourceCategory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRollup {
    pub domain: String,
    pub requests: u64,
    pub bytes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRollup {
    pub category: ResourceCategory,
    pub requests: u64,
    pub bytes: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowRequest {
    pub url: String,
    pub duration_ms: f64,
    pub bytes: u64,
    pub category: ResourceCategory,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStats {
    pub enabled: bool,
    pub captured: bool,
    pub fragments: u64,
    pub size_bytes: u64,
    pub complete: bool,
}
