use loadscope_core_types::RequestId;
use network_rollup::{NetEvent, NetworkState, SLOWEST_CAP};

fn feed_request(state: &mut NetworkState, id: &str, url: &str, bytes: u64, duration_ms: f64) {
    state.apply(NetEvent::RequestInitiated {
        id: RequestId::from(id),
        url: url.to_string(),
        initiator: None,
        category_hint: None,
        ts_ms: Some(0.0),
    });
    state.apply(NetEvent::RequestFinished {
        id: RequestId::from(id),
        encoded_bytes: bytes,
        ts_ms: Some(duration_ms),
    });
}

#[test]
fn domains_sort_by_bytes_descending() {
    let mut state = NetworkState::new(false);
    feed_request(&mut state, "a", "https://small.test/a", 100, 10.0);
    feed_request(&mut state, "b", "https://big.test/b", 9_000, 10.0);
    feed_request(&mut state, "c", "https://mid.test/c", 4_000, 10.0);

    let snapshot = state.snapshot();
    let domains: Vec<&str> = snapshot
        .by_domain
        .iter()
        .map(|rollup| rollup.domain.as_str())
        .collect();
    assert_eq!(domains, vec!["big.test", "mid.test", "small.test"]);
}

#[test]
fn domain_ties_keep_first_seen_order() {
    let mut state = NetworkState::new(false);
    feed_request(&mut state, "a", "https://first.test/a", 500, 10.0);
    feed_request(&mut state, "b", "https://second.test/b", 500, 10.0);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.by_domain[0].domain, "first.test");
    assert_eq!(snapshot.by_domain[1].domain, "second.test");
}

#[test]
fn slowest_is_capped_and_sorted() {
    let mut state = NetworkState::new(false);
    for i in 0..14u32 {
        feed_request(
            &mut state,
            &format!("r{i}"),
            &format!("https://example.com/{i}"),
            10,
            f64::from(i + 1) * 10.0,
        );
    }

    let snapshot = state.snapshot();
    assert_eq!(snapshot.slowest.len(), SLOWEST_CAP);
    assert_eq!(snapshot.slowest[0].duration_ms, 140.0);
    let mut last = f64::INFINITY;
    for entry in &snapshot.slowest {
        assert!(entry.duration_ms <= last);
        last = entry.duration_ms;
    }
}

#[test]
fn slowest_ties_keep_event_order() {
    let mut state = NetworkState::new(false);
    feed_request(&mut state, "a", "https://example.com/a", 1, 50.0);
    feed_request(&mut state, "b", "https://example.com/b", 1, 50.0);
    feed_request(&mut state, "c", "https://example.com/c", 1, 80.0);

    let snapshot = state.snapshot();
    let urls: Vec<&str> = snapshot
        .slowest
        .iter()
        .map(|entry| entry.url.as_str())
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://example.com/c",
            "https://example.com/a",
            "https://example.com/b"
        ]
    );
}

#[test]
fn categories_roll_up_finished_requests() {
    let mut state = NetworkState::new(false);
    state.apply(NetEvent::RequestInitiated {
        id: RequestId::from("doc"),
        url: "https://example.com/index.html".to_string(),
        initiator: None,
        category_hint: Some("document".to_string()),
        ts_ms: Some(0.0),
    });
    state.apply(NetEvent::RequestFinished {
        id: RequestId::from("doc"),
        encoded_bytes: 20_000,
        ts_ms: Some(120.0),
    });
    feed_request(&mut state, "js", "https://example.com/app.js", 80_000, 60.0);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.by_type.len(), 2);
    assert_eq!(snapshot.by_type[0].bytes, 80_000);
    assert_eq!(snapshot.by_type[0].category.as_str(), "script");
}
