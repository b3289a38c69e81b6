use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use domain_classify::{classify, origin_key, registrable_host};
use loadscope_core_types::Degradation;
use network_rollup::{CategoryRollup, NetworkSnapshot, SlowRequest};
use page_probe::PageMetrics;
use uuid::Uuid;

use crate::insight::derive_insights;
use crate::model::{
    DomainEntry, NetworkReport, ReportMeta, RunReport, Timings, TraceReport,
};

/// Layout-shift source list cap.
pub const CLS_SOURCES_CAP: usize = 5;
/// Interaction duration list cap.
pub const INTERACTIONS_CAP: usize = 10;

/// Session metadata carried into the report.
#[derive(Clone, Debug)]
pub struct SessionMeta {
    pub url: Option<String>,
    pub cold_load: bool,
    pub trace_enabled: bool,
    pub started_at: DateTime<Utc>,
}

/// Merge the two source snapshots and the session metadata into one
/// immutable report. Pure: no shared state with either source.
pub fn assemble(
    meta: SessionMeta,
    page: Option<PageMetrics>,
    net: NetworkSnapshot,
    diagnostics: Vec<Degradation>,
) -> RunReport {
    let page_host = meta.url.as_deref().and_then(registrable_host);
    let origin = meta.url.as_deref().and_then(origin_key);

    let by_domain: Vec<DomainEntry> = net
        .by_domain
        .iter()
        .map(|rollup| DomainEntry {
            domain: rollup.domain.clone(),
            requests: rollup.requests,
            bytes: rollup.bytes,
            // With no known page host every domain counts as
            // first-party: never over-report third-party share.
            third_party: page_host
                .as_deref()
                .map(|host| rollup.domain != host)
                .unwrap_or(false),
        })
        .collect();

    let (by_type, slowest) = network_breakdown(&net, page.as_ref());

    let timings = page
        .as_ref()
        .map(|metrics| Timings {
            ttfb: metrics.ttfb,
            fcp: metrics.fcp,
            lcp: metrics.lcp,
            inp: metrics.inp,
            cls: metrics.cls,
            dom_content_loaded: metrics.dom_content_loaded,
            load: metrics.load,
        })
        .unwrap_or_default();

    let mut cls_sources = page
        .as_ref()
        .map(|metrics| metrics.cls_sources.clone())
        .unwrap_or_default();
    cls_sources.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    cls_sources.truncate(CLS_SOURCES_CAP);

    let mut interaction_durations = page
        .as_ref()
        .map(|metrics| metrics.interaction_durations.clone())
        .unwrap_or_default();
    interaction_durations.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    interaction_durations.truncate(INTERACTIONS_CAP);

    let mut report = RunReport {
        meta: ReportMeta {
            url: meta.url,
            origin,
            captured_at: meta.started_at,
            cold_load: meta.cold_load,
            trace_enabled: meta.trace_enabled,
        },
        timings,
        long_tasks: page
            .as_ref()
            .map(|metrics| metrics.long_tasks)
            .unwrap_or_default(),
        network: NetworkReport {
            requests_total: net.requests_total,
            transferred_bytes: net.transferred_bytes,
            cache_hit_rate: net.cache_hit_rate,
            failures: net.failures.clone(),
            by_domain,
            by_type,
            slowest,
        },
        lcp_element: page.as_ref().and_then(|metrics| metrics.lcp_element.clone()),
        cls_sources,
        interaction_durations,
        insights: Vec::new(),
        trace: TraceReport {
            captured: net.trace.captured,
            size_bytes: net.trace.size_bytes,
            fragments: net.trace.fragments,
            reference: net
                .trace
                .captured
                .then(|| Uuid::new_v4().to_string()),
        },
        diagnostics,
    };
    report.insights = derive_insights(&report);
    report
}

/// The link-fed rollup is authoritative for byType/slowest. When it saw
/// no finished requests at all (attached after the load, no cold
/// reload) the page's own resource timing stands in; bytes are unknown
/// there and reported as zero.
fn network_breakdown(
    net: &NetworkSnapshot,
    page: Option<&PageMetrics>,
) -> (Vec<CategoryRollup>, Vec<SlowRequest>) {
    if !net.by_type.is_empty() {
        return (net.by_type.clone(), net.slowest.clone());
    }
    let Some(resources) = page.and_then(|metrics| metrics.resources.as_ref()) else {
        return (net.by_type.clone(), net.slowest.clone());
    };

    let by_type = resources
        .by_type
        .iter()
        .map(|entry| CategoryRollup {
            category: classify(Some(entry.kind.as_str()), None, ""),
            requests: entry.count,
            bytes: 0,
        })
        .collect();

    let mut slowest: Vec<SlowRequest> = resources
        .slowest
        .iter()
        .map(|entry| SlowRequest {
            url: entry.url.clone(),
            duration_ms: entry.duration_ms,
            bytes: 0,
            category: classify(None, None, &entry.url),
        })
        .collect();
    slowest.sort_by(|a, b| {
        b.duration_ms
            .partial_cmp(&a.duration_ms)
            .unwrap_or(Ordering::Equal)
    });
    slowest.truncate(network_rollup::SLOWEST_CAP);
    (by_type, slowest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use network_rollup::{DomainRollup, NetworkState, NetEvent};
    use loadscope_core_types::RequestId;
    use page_probe::{LayoutShiftSource, ResourceBreakdown, ResourceEntry, TypeCount};

    fn meta(url: Option<&str>) -> SessionMeta {
        SessionMeta {
            url: url.map(str::to_string),
            cold_load: false,
            trace_enabled: false,
            started_at: Utc::now(),
        }
    }

    fn snapshot_with_domains(entries: &[(&str, u64)]) -> NetworkSnapshot {
        NetworkSnapshot {
            requests_total: entries.len() as u64,
            transferred_bytes: entries.iter().map(|(_, bytes)| bytes).sum(),
            by_domain: entries
                .iter()
                .map(|(domain, bytes)| DomainRollup {
                    domain: domain.to_string(),
                    requests: 1,
                    bytes: *bytes,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn third_party_resolution_uses_page_host() {
        let report = assemble(
            meta(Some("https://www.example.com/home")),
            None,
            snapshot_with_domains(&[("example.com", 10), ("cdn.test", 5)]),
            Vec::new(),
        );
        assert!(!report.network.by_domain[0].third_party);
        assert!(report.network.by_domain[1].third_party);
        assert_eq!(report.meta.origin.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn unknown_page_host_marks_everything_first_party() {
        let report = assemble(
            meta(None),
            None,
            snapshot_with_domains(&[("cdn.test", 5)]),
            Vec::new(),
        );
        assert!(!report.network.by_domain[0].third_party);
    }

    #[test]
    fn cls_sources_sorted_and_capped() {
        let page = PageMetrics {
            cls_sources: (0..8)
                .map(|i| LayoutShiftSource {
                    selector: format!("div.s{i}"),
                    score: f64::from(i) * 0.01,
                })
                .collect(),
            ..Default::default()
        };
        let report = assemble(meta(None), Some(page), NetworkSnapshot::default(), Vec::new());
        assert_eq!(report.cls_sources.len(), CLS_SOURCES_CAP);
        assert_eq!(report.cls_sources[0].selector, "div.s7");
    }

    #[test]
    fn missing_page_metrics_leave_timings_null() {
        let report = assemble(meta(None), None, NetworkSnapshot::default(), Vec::new());
        assert!(report.timings.lcp.is_none());
        assert!(report.timings.ttfb.is_none());
        assert!(report.lcp_element.is_none());
        assert_eq!(report.insights[0].code, "all-good");
    }

    #[test]
    fn probe_resources_back_fill_empty_rollup() {
        let page = PageMetrics {
            resources: Some(ResourceBreakdown {
                by_type: vec![TypeCount {
                    kind: "script".into(),
                    count: 3,
                }],
                slowest: vec![
                    ResourceEntry {
                        url: "https://example.com/slow.js".into(),
                        duration_ms: 300.0,
                    },
                    ResourceEntry {
                        url: "https://example.com/fast.css".into(),
                        duration_ms: 20.0,
                    },
                ],
                largest: Vec::new(),
                third_party_count: 0,
            }),
            ..Default::default()
        };
        let report = assemble(meta(None), Some(page), NetworkSnapshot::default(), Vec::new());
        assert_eq!(report.network.by_type.len(), 1);
        assert_eq!(report.network.slowest[0].url, "https://example.com/slow.js");
    }

    #[test]
    fn rollup_wins_over_probe_resources() {
        let mut state = NetworkState::new(false);
        state.apply(NetEvent::RequestInitiated {
            id: RequestId::from("r1"),
            url: "https://example.com/app.js".into(),
            initiator: None,
            category_hint: Some("script".into()),
            ts_ms: Some(0.0),
        });
        state.apply(NetEvent::RequestFinished {
            id: RequestId::from("r1"),
            encoded_bytes: 128,
            ts_ms: Some(40.0),
        });
        let page = PageMetrics {
            resources: Some(ResourceBreakdown::default()),
            ..Default::default()
        };
        let report = assemble(meta(None), Some(page), state.snapshot(), Vec::new());
        assert_eq!(report.network.slowest[0].bytes, 128);
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = assemble(
            meta(Some("https://example.com/")),
            Some(PageMetrics {
                lcp: Some(2_000.0),
                ..Default::default()
            }),
            snapshot_with_domains(&[("example.com", 42)]),
            vec![Degradation::ProbeStopFailed],
        );
        let json = serde_json::to_string(&report).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.network.by_domain[0].bytes, 42);
        assert_eq!(parsed.diagnostics, vec![Degradation::ProbeStopFailed]);
        assert!(json.contains("\"capturedAt\""));
        assert!(json.contains("\"cacheHitRate\""));
    }
}
