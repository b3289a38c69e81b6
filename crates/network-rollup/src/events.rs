use loadscope_core_types::RequestId;

/// Typed network/trace events consumed by [`crate::NetworkState`].
///
/// Timestamps are milliseconds on the event source's monotonic clock
/// and may be absent; the state machine falls back to its own wall
/// clock when it cannot compute a delta from source timestamps.
#[derive(Clone, Debug)]
pub enum NetEvent {
    RequestInitiated {
        id: RequestId,
        url: String,
        initiator: Option<String>,
        category_hint: Option<String>,
        ts_ms: Option<f64>,
    },
    ResponseReceived {
        id: RequestId,
        from_cache: bool,
        mime: Option<String>,
        status: Option<u16>,
    },
    RequestFinished {
        id: RequestId,
        encoded_bytes: u64,
        ts_ms: Option<f64>,
    },
    RequestFailed {
        id: RequestId,
        error: String,
        category_hint: Option<String>,
    },
    TraceData {
        fragment: String,
    },
    TraceComplete,
}
