use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use domain_classify::{classify, registrable_host, ResourceCategory};
use loadscope_core_types::RequestId;
use tracing::debug;

use crate::events::NetEvent;
use crate::snapshot::{
    CategoryRollup, DomainRollup, FailureRecord, NetworkSnapshot, SlowRequest, TraceStats,
    SLOWEST_CAP,
};

/// In-flight record for one network request, mutated in place as
/// correlated events arrive. Once terminal, no further mutation.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub url: String,
    pub domain: Option<String>,
    pub category: ResourceCategory,
    pub initiator: Option<String>,
    pub from_cache: bool,
    pub mime: Option<String>,
    pub status: Option<u16>,
    pub bytes: u64,
    pub duration_ms: Option<f64>,
    started_ts: Option<f64>,
    started_wall: Instant,
    terminal: bool,
    seq: u64,
}

impl PendingRequest {
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

#[derive(Clone, Debug, Default)]
struct DomainTally {
    requests: u64,
    bytes: u64,
    first_seen: u64,
}

#[derive(Clone, Debug)]
struct TraceBuffer {
    enabled: bool,
    fragments: Vec<String>,
    size_bytes: u64,
    complete: bool,
}

/// Aggregation state machine for one session's network activity.
///
/// Fed by the engine's event dispatcher; never blocks, never retries,
/// and silently drops events for request ids it has not seen (the
/// initiation may have been missed during an attach race).
#[derive(Debug)]
pub struct NetworkState {
    requests: HashMap<RequestId, PendingRequest>,
    requests_total: u64,
    transferred_bytes: u64,
    cache_hits: u64,
    failures: Vec<FailureRecord>,
    domains: HashMap<String, DomainTally>,
    trace: TraceBuffer,
    seq: u64,
}

impl NetworkState {
    pub fn new(trace_enabled: bool) -> Self {
        Self {
            requests: HashMap::new(),
            requests_total: 0,
            transferred_bytes: 0,
            cache_hits: 0,
            failures: Vec::new(),
            domains: HashMap::new(),
            trace: TraceBuffer {
                enabled: trace_enabled,
                fragments: Vec::new(),
                size_bytes: 0,
                complete: false,
            },
            seq: 0,
        }
    }

    /// Stop collecting trace fragments (trace start failed downstream).
    pub fn disable_trace(&mut self) {
        self.trace.enabled = false;
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.enabled
    }

    pub fn trace_fragments(&self) -> usize {
        self.trace.fragments.len()
    }

    pub fn trace_complete(&self) -> bool {
        self.trace.complete
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total
    }

    pub fn pending(&self, id: &RequestId) -> Option<&PendingRequest> {
        self.requests.get(id)
    }

    pub fn apply(&mut self, event: NetEvent) {
        match event {
            NetEvent::RequestInitiated {
                id,
                url,
                initiator,
                category_hint,
                ts_ms,
            } => self.request_initiated(id, url, initiator, category_hint, ts_ms),
            NetEvent::ResponseReceived {
                id,
                from_cache,
                mime,
                status,
            } => self.response_received(&id, from_cache, mime, status),
            NetEvent::RequestFinished {
                id,
                encoded_bytes,
                ts_ms,
            } => self.request_finished(&id, encoded_bytes, ts_ms),
            NetEvent::RequestFailed {
                id,
                error,
                category_hint,
            } => self.request_failed(&id, error, category_hint),
            NetEvent::TraceData { fragment } => self.trace_data(fragment),
            NetEvent::TraceComplete => self.trace_complete_marked(),
        }
    }

    fn request_initiated(
        &mut self,
        id: RequestId,
        url: String,
        initiator: Option<String>,
        category_hint: Option<String>,
        ts_ms: Option<f64>,
    ) {
        self.seq += 1;
        self.requests_total += 1;

        let domain = registrable_host(&url);
        if let Some(domain) = &domain {
            let next_seq = self.seq;
            let tally = self
                .domains
                .entry(domain.clone())
                .or_insert_with(|| DomainTally {
                    first_seen: next_seq,
                    ..Default::default()
                });
            tally.requests += 1;
        }

        let category = classify(category_hint.as_deref(), None, &url);
        let pending = PendingRequest {
            url,
            domain,
            category,
            initiator,
            from_cache: false,
            mime: None,
            status: None,
            bytes: 0,
            duration_ms: None,
            started_ts: ts_ms,
            started_wall: Instant::now(),
            terminal: false,
            seq: self.seq,
        };
        // An existing entry is overwritten on purpose: a repeated
        // initiation for the same id is a redirect restart.
        if self.requests.insert(id.clone(), pending).is_some() {
            debug!(%id, "request restarted (redirect)");
        }
    }

    fn response_received(
        &mut self,
        id: &RequestId,
        from_cache: bool,
        mime: Option<String>,
        status: Option<u16>,
    ) {
        let Some(request) = self.requests.get_mut(id) else {
            debug!(%id, "response for unknown request dropped");
            return;
        };
        if request.terminal {
            return;
        }
        if from_cache && !request.from_cache {
            request.from_cache = true;
            self.cache_hits += 1;
        }
        if let Some(mime) = mime {
            request.category = classify(None, Some(&mime), &request.url);
            request.mime = Some(mime);
        }
        if status.is_some() {
            request.status = status;
        }
    }

    fn request_finished(&mut self, id: &RequestId, encoded_bytes: u64, ts_ms: Option<f64>) {
        let Some(request) = self.requests.get_mut(id) else {
            debug!(%id, "finish for unknown request dropped");
            return;
        };
        if request.terminal {
            debug!(%id, "duplicate terminal event ignored");
            return;
        }
        request.terminal = true;
        request.bytes = encoded_bytes;
        request.duration_ms = Some(match (request.started_ts, ts_ms) {
            (Some(start), Some(end)) if end >= start => end - start,
            _ => request.started_wall.elapsed().as_secs_f64() * 1000.0,
        });

        self.transferred_bytes += encoded_bytes;
        if let Some(domain) = &request.domain {
            if let Some(tally) = self.domains.get_mut(domain) {
                tally.bytes += encoded_bytes;
            }
        }
    }

    fn request_failed(&mut self, id: &RequestId, error: String, category_hint: Option<String>) {
        let Some(request) = self.requests.get_mut(id) else {
            debug!(%id, "failure for unknown request dropped");
            return;
        };
        if request.terminal {
            debug!(%id, "duplicate terminal event ignored");
            return;
        }
        request.terminal = true;
        let category = match category_hint.as_deref() {
            Some(hint) => classify(Some(hint), None, &request.url),
            None => request.category,
        };
        self.failures.push(FailureRecord {
            url: request.url.clone(),
            error,
            category,
        });
    }

    fn trace_data(&mut self, fragment: String) {
        if !self.trace.enabled {
            return;
        }
        self.trace.size_bytes += fragment.len() as u64;
        self.trace.fragments.push(fragment);
    }

    fn trace_complete_marked(&mut self) {
        if self.trace.enabled {
            self.trace.complete = true;
        }
    }

    /// Project the current state into an immutable rollup.
    ///
    /// Requests without a terminal event count toward `requests_total`
    /// only; their bytes and durations are unknown.
    pub fn snapshot(&self) -> NetworkSnapshot {
        let cache_hit_rate = if self.requests_total > 0 {
            Some(self.cache_hits as f64 / self.requests_total as f64)
        } else {
            None
        };

        let mut by_domain: Vec<(u64, DomainRollup)> = self
            .domains
            .iter()
            .map(|(domain, tally)| {
                (
                    tally.first_seen,
                    DomainRollup {
                        domain: domain.clone(),
                        requests: tally.requests,
                        bytes: tally.bytes,
                    },
                )
            })
            .collect();
        by_domain.sort_by_key(|(first_seen, _)| *first_seen);
        let mut by_domain: Vec<DomainRollup> =
            by_domain.into_iter().map(|(_, rollup)| rollup).collect();
        by_domain.sort_by(|a, b| b.bytes.cmp(&a.bytes));

        let mut finished: Vec<&PendingRequest> = self
            .requests
            .values()
            .filter(|request| request.duration_ms.is_some())
            .collect();
        finished.sort_by_key(|request| request.seq);

        let mut per_category: HashMap<ResourceCategory, CategoryRollup> = HashMap::new();
        for request in &finished {
            let rollup = per_category
                .entry(request.category)
                .or_insert_with(|| CategoryRollup {
                    category: request.category,
                    requests: 0,
                    bytes: 0,
                });
            rollup.requests += 1;
            rollup.bytes += request.bytes;
        }
        let mut by_type: Vec<CategoryRollup> = per_category.into_values().collect();
        by_type.sort_by(|a, b| b.bytes.cmp(&a.bytes).then(b.requests.cmp(&a.requests)));

        let mut slowest: Vec<SlowRequest> = finished
            .iter()
            .map(|request| SlowRequest {
                url: request.url.clone(),
                duration_ms: request.duration_ms.unwrap_or_default(),
                bytes: request.bytes,
                category: request.category,
            })
            .collect();
        slowest.sort_by(|a, b| {
            b.duration_ms
                .partial_cmp(&a.duration_ms)
                .unwrap_or(Ordering::Equal)
        });
        slowest.truncate(SLOWEST_CAP);

        NetworkSnapshot {
            requests_total: self.requests_total,
            transferred_bytes: self.transferred_bytes,
            cache_hits: self.cache_hits,
            cache_hit_rate,
            failures: self.failures.clone(),
            by_domain,
            by_type,
            slowest,
            trace: TraceStats {
                enabled: self.trace.enabled,
                captured: !self.trace.fragments.is_empty(),
                fragments: self.trace.fragments.len() as u64,
                size_bytes: self.trace.size_bytes,
                complete: self.trace.complete,
            },
        }
    }
}
