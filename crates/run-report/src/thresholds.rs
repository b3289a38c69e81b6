//! Canonical web-vitals thresholds and the insight rule bounds.
//!
//! Good/poor boundaries follow the published web-vitals values; the
//! rule table in [`crate::derive_insights`] reads its limits from a
//! [`Thresholds`] value so callers can override any of them.

pub const LCP_GOOD_MS: f64 = 2_500.0;
pub const LCP_POOR_MS: f64 = 4_000.0;
pub const FCP_GOOD_MS: f64 = 1_800.0;
pub const FCP_POOR_MS: f64 = 3_000.0;
pub const INP_GOOD_MS: f64 = 200.0;
pub const INP_POOR_MS: f64 = 500.0;
pub const CLS_GOOD: f64 = 0.1;
pub const CLS_POOR: f64 = 0.25;
pub const TTFB_GOOD_MS: f64 = 800.0;
pub const TTFB_POOR_MS: f64 = 1_800.0;

/// Total long-task time considered excessive for one load.
pub const LONG_TASK_BUDGET_MS: f64 = 200.0;
/// Transferred payload considered heavy (2 MB).
pub const PAGE_WEIGHT_POOR_BYTES: u64 = 2_000_000;
/// Request count considered excessive.
pub const REQUEST_COUNT_POOR: u64 = 150;
/// Third-party byte share worth flagging.
pub const THIRD_PARTY_SHARE_HIGH: f64 = 0.30;
/// Cache hit rate below which repeat-visit caching looks ineffective.
pub const CACHE_RATE_FLOOR: f64 = 0.30;
/// Minimum request count before the cache rule applies.
pub const CACHE_RATE_MIN_REQUESTS: u64 = 5;

/// Overridable bounds for the insight rule table.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thresholds {
    pub lcp_slow_ms: f64,
    pub lcp_poor_ms: f64,
    pub inp_slow_ms: f64,
    pub long_task_budget_ms: f64,
    pub cls_slow: f64,
    pub cls_poor: f64,
    pub ttfb_slow_ms: f64,
    pub page_weight_poor_bytes: u64,
    pub request_count_poor: u64,
    pub third_party_share_high: f64,
    pub cache_rate_floor: f64,
    pub cache_rate_min_requests: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lcp_slow_ms: LCP_GOOD_MS,
            lcp_poor_ms: LCP_POOR_MS,
            inp_slow_ms: INP_GOOD_MS,
            long_task_budget_ms: LONG_TASK_BUDGET_MS,
            cls_slow: CLS_GOOD,
            cls_poor: CLS_POOR,
            ttfb_slow_ms: TTFB_GOOD_MS,
            page_weight_poor_bytes: PAGE_WEIGHT_POOR_BYTES,
            request_count_poor: REQUEST_COUNT_POOR,
            third_party_share_high: THIRD_PARTY_SHARE_HIGH,
            cache_rate_floor: CACHE_RATE_FLOOR,
            cache_rate_min_requests: CACHE_RATE_MIN_REQUESTS,
        }
    }
}
