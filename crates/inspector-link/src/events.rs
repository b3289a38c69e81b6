use loadscope_core_types::TargetId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event method names delivered over the link.
pub mod methods {
    /// A network request left the target.
    pub const REQUEST_INITIATED: &str = "net.requestInitiated";
    /// Response headers arrived for an in-flight request.
    pub const RESPONSE_RECEIVED: &str = "net.responseReceived";
    /// Terminal: the request body finished loading.
    pub const REQUEST_FINISHED: &str = "net.requestFinished";
    /// Terminal: the request was aborted or errored.
    pub const REQUEST_FAILED: &str = "net.requestFailed";
    /// A chunk of trace capture data.
    pub const TRACE_DATA: &str = "trace.data";
    /// Trace capture drained its final chunk.
    pub const TRACE_COMPLETE: &str = "trace.complete";
    /// The target committed a navigation.
    pub const TARGET_NAVIGATED: &str = "target.navigated";
    /// The target was closed or crashed.
    pub const TARGET_DESTROYED: &str = "target.destroyed";
    /// Something else detached the link from the target.
    pub const TARGET_DETACHED: &str = "target.detached";
}

/// Raw `(target, method, params)` tuple as delivered by the link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkEvent {
    pub target: TargetId,
    pub method: String,
    pub params: Value,
}

impl LinkEvent {
    pub fn new(target: TargetId, method: impl Into<String>, params: Value) -> Self {
        Self {
            target,
            method: method.into(),
            params,
        }
    }
}
