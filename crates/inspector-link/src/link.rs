use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use loadscope_core_types::TargetId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::errors::{LinkError, LinkErrorKind};
use crate::events::LinkEvent;

/// Minimal capability surface the engine requires from a link
/// implementation.
#[async_trait]
pub trait InspectorLink: Send + Sync {
    /// Open the link to a target. Fails with
    /// [`LinkErrorKind::ProtectedTarget`] for contexts that refuse
    /// instrumentation.
    async fn attach(&self, target: &TargetId) -> Result<(), LinkError>;

    /// Release the link. Idempotent; never fails observably.
    async fn detach(&self, target: &TargetId);

    /// Issue a request/response command against an attached target.
    async fn send_command(
        &self,
        target: &TargetId,
        method: &str,
        params: Value,
    ) -> Result<Value, LinkError>;

    /// Subscribe to the link's event stream.
    fn subscribe(&self) -> broadcast::Receiver<LinkEvent>;
}

/// Link with no backend; every command fails. Useful as a placeholder
/// when wiring components that never go live.
pub struct NoopLink {
    events: broadcast::Sender<LinkEvent>,
}

impl NoopLink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for NoopLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InspectorLink for NoopLink {
    async fn attach(&self, _target: &TargetId) -> Result<(), LinkError> {
        Ok(())
    }

    async fn detach(&self, _target: &TargetId) {}

    async fn send_command(
        &self,
        _target: &TargetId,
        method: &str,
        _params: Value,
    ) -> Result<Value, LinkError> {
        Err(LinkError::new(LinkErrorKind::Internal)
            .with_hint(format!("no backend for method {method}")))
    }

    fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }
}

/// Scriptable in-memory link used by the engine tests and the offline
/// replay harness. Commands succeed with `{}` unless a failure or a
/// canned response was configured for the method; events are injected
/// with [`StubLink::emit`].
pub struct StubLink {
    events: broadcast::Sender<LinkEvent>,
    attached: DashMap<TargetId, ()>,
    refuse_attach: Mutex<Option<LinkErrorKind>>,
    failing_commands: Mutex<HashSet<String>>,
    responses: Mutex<HashMap<String, Value>>,
    sent: Mutex<Vec<(TargetId, String, Value)>>,
    detach_calls: AtomicUsize,
}

impl StubLink {
    pub fn new(buffer: usize) -> Self {
        let (events, _) = broadcast::channel(buffer.max(1));
        Self {
            events,
            attached: DashMap::new(),
            refuse_attach: Mutex::new(None),
            failing_commands: Mutex::new(HashSet::new()),
            responses: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            detach_calls: AtomicUsize::new(0),
        }
    }

    /// Make subsequent `attach` calls fail with the given kind.
    pub fn refuse_attach(&self, kind: LinkErrorKind) {
        *self.refuse_attach.lock() = Some(kind);
    }

    /// Make `send_command` fail for one method.
    pub fn fail_command(&self, method: &str) {
        self.failing_commands.lock().insert(method.to_string());
    }

    /// Configure the value returned for one method.
    pub fn respond_with(&self, method: &str, result: Value) {
        self.responses.lock().insert(method.to_string(), result);
    }

    /// Inject an event into the stream, as the wire would.
    pub fn emit(&self, event: LinkEvent) {
        // Send errors only mean nobody is subscribed yet.
        let _ = self.events.send(event);
    }

    pub fn is_attached(&self, target: &TargetId) -> bool {
        self.attached.contains_key(target)
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls.load(Ordering::SeqCst)
    }

    /// Methods sent so far, in order.
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|(_, method, _)| method.clone())
            .collect()
    }
}

#[async_trait]
impl InspectorLink for StubLink {
    async fn attach(&self, target: &TargetId) -> Result<(), LinkError> {
        if let Some(kind) = *self.refuse_attach.lock() {
            return Err(LinkError::new(kind).with_hint("attach refused by stub"));
        }
        self.attached.insert(target.clone(), ());
        Ok(())
    }

    async fn detach(&self, target: &TargetId) {
        self.detach_calls.fetch_add(1, Ordering::SeqCst);
        if self.attached.remove(target).is_none() {
            debug!(%target, "detach on unattached target (idempotent)");
        }
    }

    async fn send_command(
        &self,
        target: &TargetId,
        method: &str,
        params: Value,
    ) -> Result<Value, LinkError> {
        self.sent
            .lock()
            .push((target.clone(), method.to_string(), params));
        if self.failing_commands.lock().contains(method) {
            return Err(LinkError::new(LinkErrorKind::CommandFailed)
                .with_hint(format!("stubbed failure for {method}")));
        }
        let canned = self.responses.lock().get(method).cloned();
        Ok(canned.unwrap_or_else(|| json!({})))
    }

    fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }
}
