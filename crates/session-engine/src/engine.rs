use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use history_store::HistoryStore;
use inspector_link::{commands, InspectorLink, LinkErrorKind, LinkEvent};
use loadscope_core_types::{Degradation, SessionOptions, TargetId};
use loadscope_session_store::{Session, SessionStore};
use page_probe::{PageMetrics, PageProbe};
use parking_lot::RwLock;
use run_report::{assemble, RunReport, SessionMeta};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decode::{route, Routed};
use crate::errors::EngineError;
use crate::metrics;

/// Answer to the `status` operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TargetStatus {
    pub active: bool,
}

/// Orchestrates measurement sessions over one inspector link and one
/// page probe. All cross-boundary calls are async; session state is
/// only ever touched through short, non-await-holding lock scopes.
pub struct SessionEngine {
    store: SessionStore,
    link: Arc<dyn InspectorLink>,
    probe: Arc<dyn PageProbe>,
    history: Option<Arc<dyn HistoryStore>>,
    config: EngineConfig,
    /// Targets with a `start` in flight: makes Idle → Attaching atomic
    /// so two interleaved starts cannot both attach.
    starting: DashMap<TargetId, ()>,
}

impl SessionEngine {
    pub fn new(
        link: Arc<dyn InspectorLink>,
        probe: Arc<dyn PageProbe>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            link,
            probe,
            history: None,
            config,
            starting: DashMap::new(),
        }
    }

    /// Attach a history store; stop will append each report to it,
    /// keyed by the page's registrable origin.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn status(&self, target: &TargetId) -> TargetStatus {
        TargetStatus {
            active: self.store.contains(target),
        }
    }

    pub fn active_targets(&self) -> Vec<TargetId> {
        self.store.targets()
    }

    /// Start a session. Only the mandatory path (attach, channel
    /// enable) can fail; a failure there leaves no session registered
    /// and no link held.
    pub async fn start(
        &self,
        target: &TargetId,
        options: SessionOptions,
    ) -> Result<(), EngineError> {
        if self.store.contains(target) {
            return Err(EngineError::AlreadyActive);
        }
        match self.starting.entry(target.clone()) {
            Entry::Occupied(_) => return Err(EngineError::AlreadyActive),
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }
        let result = self.start_inner(target, options).await;
        self.starting.remove(target);
        if result.is_ok() {
            metrics::record_session_started();
        }
        result
    }

    async fn start_inner(
        &self,
        target: &TargetId,
        options: SessionOptions,
    ) -> Result<(), EngineError> {
        self.link.attach(target).await.map_err(|err| {
            if err.kind == LinkErrorKind::ProtectedTarget {
                EngineError::ProtectedTarget
            } else {
                EngineError::Attach(err)
            }
        })?;

        if let Err(err) = self
            .link
            .send_command(target, commands::NETWORK_ENABLE, json!({}))
            .await
        {
            self.link.detach(target).await;
            return Err(EngineError::ChannelEnable(err));
        }

        let session = match self.store.create(target, options) {
            Ok(session) => session,
            Err(_) => {
                self.link.detach(target).await;
                return Err(EngineError::AlreadyActive);
            }
        };
        info!(
            %target,
            cold_load = options.cold_load,
            trace = options.trace_enabled,
            "session started"
        );

        match self
            .link
            .send_command(target, commands::PAGE_INFO, json!({}))
            .await
        {
            Ok(page_info) => {
                if let Some(url) = page_info.get("url").and_then(Value::as_str) {
                    session.write().page_url = Some(url.to_string());
                }
            }
            Err(err) => {
                debug!(%target, %err, "page info unavailable");
                session.write().degrade(Degradation::PageInfoUnavailable);
            }
        }

        if options.trace_enabled {
            if let Err(err) = self
                .link
                .send_command(target, commands::TRACE_START, json!({}))
                .await
            {
                warn!(%target, %err, "trace start failed, tracing disabled for this session");
                let mut guard = session.write();
                guard.degrade(Degradation::TraceStartFailed);
                guard.network.disable_trace();
            }
        }

        if options.cold_load {
            if let Err(err) = self
                .link
                .send_command(target, commands::RELOAD_BYPASS_CACHE, json!({}))
                .await
            {
                warn!(%target, %err, "cache-bypassing reload failed, falling back");
                session.write().degrade(Degradation::ColdReloadFellBack);
                if let Err(err) = self
                    .link
                    .send_command(target, commands::RELOAD, json!({}))
                    .await
                {
                    warn!(%target, %err, "fallback reload failed");
                    session.write().degrade(Degradation::ColdReloadUnavailable);
                }
            }
        }

        if let Err(err) = self.probe.start(target).await {
            warn!(%target, %err, "page probe unavailable, session continues without page metrics");
            session.write().degrade(Degradation::ProbeStartFailed);
        }

        Ok(())
    }

    /// Stop a session and assemble its report.
    ///
    /// The teardown half is unconditional: after the stopping latch is
    /// taken, the link is released and the session removed exactly
    /// once, regardless of which best-effort steps failed.
    pub async fn stop(&self, target: &TargetId) -> Result<RunReport, EngineError> {
        let session = self
            .store
            .get(target)
            .ok_or(EngineError::NoActiveSession)?;
        if !session.write().begin_stop() {
            return Err(EngineError::NoActiveSession);
        }

        let page = self.snapshot_probe(target, &session).await;
        if let Err(err) = self.probe.stop(target).await {
            debug!(%target, %err, "probe stop failed");
            session.write().degrade(Degradation::ProbeStopFailed);
        }
        self.drain_trace(target, &session).await;

        self.link.detach(target).await;
        self.store.remove(target);
        metrics::record_session_stopped();
        info!(%target, "session stopped");

        let (meta, net, diagnostics) = {
            let guard = session.read();
            (
                SessionMeta {
                    url: guard.page_url.clone(),
                    cold_load: guard.options.cold_load,
                    trace_enabled: guard.options.trace_enabled,
                    started_at: guard.started_at,
                },
                guard.network.snapshot(),
                guard.degradations().to_vec(),
            )
        };
        let report = assemble(meta, page, net, diagnostics);

        if let Some(history) = &self.history {
            let key = report
                .meta
                .origin
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            if let Err(err) = history.append(&key, report.clone()).await {
                warn!(%target, %err, "history append failed");
            }
        }
        Ok(report)
    }

    async fn snapshot_probe(
        &self,
        target: &TargetId,
        session: &Arc<RwLock<Session>>,
    ) -> Option<PageMetrics> {
        match self.probe.snapshot(target).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%target, %err, "probe snapshot failed, page metrics empty");
                session.write().degrade(Degradation::ProbeSnapshotFailed);
                None
            }
        }
    }

    /// Request trace end and, when nothing was collected yet, wait a
    /// bounded grace period for trailing fragments. Exceeding the grace
    /// is not an error; the report carries whatever arrived.
    async fn drain_trace(&self, target: &TargetId, session: &Arc<RwLock<Session>>) {
        let (active, fragments) = {
            let guard = session.read();
            (guard.network.trace_enabled(), guard.network.trace_fragments())
        };
        if !active {
            return;
        }
        if let Err(err) = self
            .link
            .send_command(target, commands::TRACE_END, json!({}))
            .await
        {
            debug!(%target, %err, "trace end request failed");
        }
        if fragments > 0 {
            return;
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.trace_grace_ms);
        loop {
            {
                let guard = session.read();
                if guard.network.trace_fragments() > 0 || guard.network.trace_complete() {
                    return;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(Duration::from_millis(self.config.trace_poll_ms.max(1))).await;
        }
        debug!(%target, "trace grace period elapsed without fragments");
        session.write().degrade(Degradation::TraceFlushTimedOut);
    }

    /// Route one link event. Events for targets without a session are
    /// dropped: the initiation may race attach, or the session may
    /// already be gone.
    pub async fn handle_link_event(&self, event: LinkEvent) {
        metrics::record_link_event();
        let Some(session) = self.store.get(&event.target) else {
            debug!(target = %event.target, method = %event.method, "event for unknown target dropped");
            return;
        };
        match route(&event.method, &event.params) {
            Some(Routed::Net(net_event)) => {
                session.write().network.apply(net_event);
            }
            Some(Routed::Navigated { url }) => {
                let cold_load = session.read().options.cold_load;
                if cold_load {
                    // The navigation we asked for: keep the session,
                    // refresh the page URL.
                    if let Some(url) = url {
                        session.write().page_url = Some(url);
                    }
                } else {
                    info!(target = %event.target, "target navigated away, releasing session");
                    self.force_cleanup(&event.target).await;
                }
            }
            Some(Routed::Gone { reason }) => {
                info!(target = %event.target, reason, "target gone, releasing session");
                self.force_cleanup(&event.target).await;
            }
            None => {
                debug!(target = %event.target, method = %event.method, "unrecognized link event dropped");
            }
        }
    }

    async fn force_cleanup(&self, target: &TargetId) {
        self.link.detach(target).await;
        if self.store.remove(target).is_some() {
            metrics::record_forced_cleanup();
        }
    }

    /// Spawn the dispatcher task draining the link's event stream.
    pub fn spawn_dispatcher(self: &Arc<Self>) -> DispatcherHandle {
        let engine = Arc::clone(self);
        let mut events = self.link.subscribe();
        let cancel = CancellationToken::new();
        let loop_token = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => engine.handle_link_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "dispatcher lagged, link events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });
        DispatcherHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Lifecycle handle for the dispatcher task.
pub struct DispatcherHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Gracefully stop the dispatcher and await its completion.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(()) => Ok(()),
                Err(err) if err.is_cancelled() => Ok(()),
                Err(err) => Err(err),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
