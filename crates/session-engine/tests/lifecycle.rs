use std::sync::Arc;
use std::time::Duration;

use history_store::{HistoryStore, InMemoryHistory};
use inspector_link::events::methods;
use inspector_link::{commands, InspectorLink, LinkEvent, StubLink};
use loadscope_core_types::{Degradation, SessionOptions, TargetId};
use loadscope_engine::{EngineConfig, EngineError, SessionEngine};
use page_probe::{NullProbe, PageMetrics, StaticProbe};
use run_report::Severity;
use serde_json::json;
use tokio::time::sleep;

fn engine_with(link: &Arc<StubLink>, probe: Arc<dyn page_probe::PageProbe>) -> Arc<SessionEngine> {
    Arc::new(SessionEngine::new(
        Arc::clone(link) as Arc<dyn InspectorLink>,
        probe,
        EngineConfig::default(),
    ))
}

fn event(target: &TargetId, method: &str, params: serde_json::Value) -> LinkEvent {
    LinkEvent::new(target.clone(), method, params)
}

fn request_events(target: &TargetId, id: &str, url: &str, bytes: u64) -> Vec<LinkEvent> {
    vec![
        event(
            target,
            methods::REQUEST_INITIATED,
            json!({ "requestId": id, "url": url, "timestamp": 0.0 }),
        ),
        event(
            target,
            methods::REQUEST_FINISHED,
            json!({ "requestId": id, "encodedBytes": bytes, "timestamp": 120.0 }),
        ),
    ]
}

#[tokio::test]
async fn full_session_produces_expected_insights() {
    let link = Arc::new(StubLink::new(16));
    link.respond_with(commands::PAGE_INFO, json!({ "url": "https://www.example.com/home" }));
    let probe = Arc::new(StaticProbe::new(Some(PageMetrics {
        lcp: Some(5_000.0),
        cls: Some(0.3),
        ttfb: Some(900.0),
        ..Default::default()
    })));
    let engine = engine_with(&link, probe);
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    assert!(engine.status(&target).active);

    for ev in request_events(&target, "r1", "https://example.com/big.bin", 2_000_000) {
        engine.handle_link_event(ev).await;
    }

    let report = engine.stop(&target).await.unwrap();
    assert!(!engine.status(&target).active);
    assert_eq!(report.meta.origin.as_deref(), Some("https://example.com"));
    assert_eq!(report.network.requests_total, 1);
    assert_eq!(report.network.transferred_bytes, 2_000_000);
    assert!(report.network.cache_hit_rate.is_some());
    assert!(!report.network.by_domain[0].third_party);

    let codes: Vec<&str> = report.insights.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["lcp", "cls", "ttfb", "page-weight"]);
    assert_eq!(report.insights[0].severity, Severity::Poor);
    assert_eq!(report.insights[2].severity, Severity::NeedsImprovement);
}

#[tokio::test]
async fn second_start_is_rejected_without_touching_the_session() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: false,
                trace_enabled: true,
            },
        )
        .await
        .unwrap();
    let err = engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyActive));

    // The original session is untouched, trace option included.
    let report = engine.stop(&target).await.unwrap();
    assert!(report.meta.trace_enabled);
}

#[tokio::test]
async fn failed_channel_enable_leaves_nothing_registered() {
    let link = Arc::new(StubLink::new(16));
    link.fail_command(commands::NETWORK_ENABLE);
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    let err = engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ChannelEnable(_)));
    assert!(!engine.status(&target).active);
    assert!(!link.is_attached(&target));
    assert_eq!(link.detach_calls(), 1);

    // No session means stop fails fast and releases nothing.
    let err = engine.stop(&target).await.unwrap_err();
    assert!(matches!(err, EngineError::NoActiveSession));
    assert_eq!(link.detach_calls(), 1);
}

#[tokio::test]
async fn refused_attach_maps_to_protected_target() {
    let link = Arc::new(StubLink::new(16));
    link.refuse_attach(inspector_link::LinkErrorKind::ProtectedTarget);
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    let err = engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ProtectedTarget));
    assert!(!engine.status(&target).active);
}

#[tokio::test]
async fn teardown_survives_every_best_effort_failure() {
    let link = Arc::new(StubLink::new(16));
    link.fail_command(commands::TRACE_END);
    let probe = Arc::new(StaticProbe::new(None));
    probe.fail_snapshot();
    probe.fail_stop();
    let engine = Arc::new(SessionEngine::new(
        Arc::clone(&link) as Arc<dyn InspectorLink>,
        probe,
        EngineConfig {
            trace_grace_ms: 40,
            trace_poll_ms: 5,
        },
    ));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: false,
                trace_enabled: true,
            },
        )
        .await
        .unwrap();

    let report = engine.stop(&target).await.unwrap();
    assert!(!engine.status(&target).active);
    assert!(!link.is_attached(&target));
    assert_eq!(link.detach_calls(), 1);
    assert!(report.diagnostics.contains(&Degradation::ProbeSnapshotFailed));
    assert!(report.diagnostics.contains(&Degradation::ProbeStopFailed));
    assert!(report.diagnostics.contains(&Degradation::TraceFlushTimedOut));
    assert!(!report.trace.captured);
}

#[tokio::test]
async fn trace_start_failure_disables_collection() {
    let link = Arc::new(StubLink::new(16));
    link.fail_command(commands::TRACE_START);
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: false,
                trace_enabled: true,
            },
        )
        .await
        .unwrap();

    engine
        .handle_link_event(event(
            &target,
            methods::TRACE_DATA,
            json!({ "chunk": "{\"ph\":\"X\"}" }),
        ))
        .await;

    let report = engine.stop(&target).await.unwrap();
    assert!(report.diagnostics.contains(&Degradation::TraceStartFailed));
    assert!(!report.trace.captured);
    assert_eq!(report.trace.size_bytes, 0);
}

#[tokio::test]
async fn cold_reload_falls_back_to_plain_reload() {
    let link = Arc::new(StubLink::new(16));
    link.fail_command(commands::RELOAD_BYPASS_CACHE);
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: true,
                trace_enabled: false,
            },
        )
        .await
        .unwrap();

    let methods_sent = link.sent_methods();
    assert!(methods_sent.contains(&commands::RELOAD_BYPASS_CACHE.to_string()));
    assert!(methods_sent.contains(&commands::RELOAD.to_string()));

    let report = engine.stop(&target).await.unwrap();
    assert!(report.diagnostics.contains(&Degradation::ColdReloadFellBack));
    assert!(!report
        .diagnostics
        .contains(&Degradation::ColdReloadUnavailable));
}

#[tokio::test]
async fn navigation_without_cold_load_forces_cleanup() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    engine
        .handle_link_event(event(
            &target,
            methods::TARGET_NAVIGATED,
            json!({ "url": "https://elsewhere.test/" }),
        ))
        .await;

    assert!(!engine.status(&target).active);
    assert!(!link.is_attached(&target));
    let err = engine.stop(&target).await.unwrap_err();
    assert!(matches!(err, EngineError::NoActiveSession));
}

#[tokio::test]
async fn navigation_during_cold_load_is_expected() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: true,
                trace_enabled: false,
            },
        )
        .await
        .unwrap();
    engine
        .handle_link_event(event(
            &target,
            methods::TARGET_NAVIGATED,
            json!({ "url": "https://example.com/reloaded" }),
        ))
        .await;

    assert!(engine.status(&target).active);
    let report = engine.stop(&target).await.unwrap();
    assert_eq!(
        report.meta.url.as_deref(),
        Some("https://example.com/reloaded")
    );
}

#[tokio::test]
async fn destroyed_target_releases_its_session() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    engine
        .handle_link_event(event(&target, methods::TARGET_DESTROYED, json!({})))
        .await;

    assert!(!engine.status(&target).active);
    assert!(!link.is_attached(&target));
}

#[tokio::test]
async fn concurrent_targets_never_share_state() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let t1 = TargetId::new();
    let t2 = TargetId::new();

    engine.start(&t1, SessionOptions::default()).await.unwrap();
    engine.start(&t2, SessionOptions::default()).await.unwrap();

    for ev in request_events(&t1, "r1", "https://example.com/only-t1", 512) {
        engine.handle_link_event(ev).await;
    }

    let report_t2 = engine.stop(&t2).await.unwrap();
    assert_eq!(report_t2.network.requests_total, 0);
    assert!(report_t2.network.cache_hit_rate.is_none());

    let report_t1 = engine.stop(&t1).await.unwrap();
    assert_eq!(report_t1.network.requests_total, 1);
    assert_eq!(report_t1.network.transferred_bytes, 512);
}

#[tokio::test]
async fn late_trace_fragment_lands_within_grace() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(
            &target,
            SessionOptions {
                cold_load: false,
                trace_enabled: true,
            },
        )
        .await
        .unwrap();

    let late = Arc::clone(&engine);
    let late_target = target.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        late.handle_link_event(LinkEvent::new(
            late_target,
            methods::TRACE_DATA,
            json!({ "chunk": "{\"trace\":1}" }),
        ))
        .await;
    });

    let report = engine.stop(&target).await.unwrap();
    assert!(report.trace.captured);
    assert_eq!(report.trace.fragments, 1);
    assert_eq!(report.trace.size_bytes, "{\"trace\":1}".len() as u64);
    assert!(report.trace.reference.is_some());
    assert!(!report.diagnostics.contains(&Degradation::TraceFlushTimedOut));
}

#[tokio::test]
async fn absent_probe_still_yields_a_complete_report() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    let report = engine.stop(&target).await.unwrap();

    assert!(report.timings.lcp.is_none());
    assert!(report.timings.ttfb.is_none());
    assert!(report.diagnostics.contains(&Degradation::ProbeStartFailed));
    assert_eq!(report.insights[0].code, "all-good");
}

#[tokio::test]
async fn stop_appends_the_report_to_history() {
    let link = Arc::new(StubLink::new(16));
    link.respond_with(
        commands::PAGE_INFO,
        json!({ "url": "https://www.example.com/pricing" }),
    );
    let history = Arc::new(InMemoryHistory::new());
    let engine = Arc::new(
        SessionEngine::new(
            Arc::clone(&link) as Arc<dyn InspectorLink>,
            Arc::new(NullProbe),
            EngineConfig::default(),
        )
        .with_history(Arc::clone(&history) as Arc<dyn HistoryStore>),
    );
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    engine.stop(&target).await.unwrap();

    let stored = history.read("https://example.com").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].meta.url.as_deref(),
        Some("https://www.example.com/pricing")
    );
}

#[tokio::test]
async fn dispatcher_drains_the_link_stream() {
    let link = Arc::new(StubLink::new(16));
    let engine = engine_with(&link, Arc::new(NullProbe));
    let handle = engine.spawn_dispatcher();
    let target = TargetId::new();

    engine
        .start(&target, SessionOptions::default())
        .await
        .unwrap();
    for ev in request_events(&target, "r1", "https://example.com/via-bus", 64) {
        link.emit(ev);
    }
    sleep(Duration::from_millis(100)).await;

    let report = engine.stop(&target).await.unwrap();
    assert_eq!(report.network.requests_total, 1);
    assert_eq!(report.network.transferred_bytes, 64);

    handle.shutdown().await.unwrap();
}
