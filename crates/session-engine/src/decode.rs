//! Mapping from raw link event tuples to typed aggregation events.
//!
//! Decoding is total: malformed or unrecognized payloads yield `None`
//! and the caller drops the event. Nothing in here may panic.

use inspector_link::events::methods;
use loadscope_core_types::RequestId;
use network_rollup::NetEvent;
use serde_json::Value;

/// Where an event should be routed after decoding.
pub(crate) enum Routed {
    /// Feed the session's network state machine.
    Net(NetEvent),
    /// The target committed a navigation.
    Navigated { url: Option<String> },
    /// The target is gone or something else took the link.
    Gone { reason: &'static str },
}

pub(crate) fn route(method: &str, params: &Value) -> Option<Routed> {
    match method {
        methods::REQUEST_INITIATED => {
            let id = str_field(params, "requestId")?;
            let url = str_field(params, "url")?;
            Some(Routed::Net(NetEvent::RequestInitiated {
                id: RequestId::from(id),
                url: url.to_string(),
                initiator: str_field(params, "initiator").map(str::to_string),
                category_hint: str_field(params, "resourceType").map(str::to_string),
                ts_ms: params.get("timestamp").and_then(Value::as_f64),
            }))
        }
        methods::RESPONSE_RECEIVED => {
            let id = str_field(params, "requestId")?;
            Some(Routed::Net(NetEvent::ResponseReceived {
                id: RequestId::from(id),
                from_cache: params
                    .get("fromCache")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                mime: str_field(params, "mimeType").map(str::to_string),
                status: params
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|status| u16::try_from(status).ok()),
            }))
        }
        methods::REQUEST_FINISHED => {
            let id = str_field(params, "requestId")?;
            Some(Routed::Net(NetEvent::RequestFinished {
                id: RequestId::from(id),
                encoded_bytes: params
                    .get("encodedBytes")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                ts_ms: params.get("timestamp").and_then(Value::as_f64),
            }))
        }
        methods::REQUEST_FAILED => {
            let id = str_field(params, "requestId")?;
            Some(Routed::Net(NetEvent::RequestFailed {
                id: RequestId::from(id),
                error: str_field(params, "errorText").unwrap_or("unknown").to_string(),
                category_hint: str_field(params, "resourceType").map(str::to_string),
            }))
        }
        methods::TRACE_DATA => {
            let fragment = str_field(params, "chunk")?;
            Some(Routed::Net(NetEvent::TraceData {
                fragment: fragment.to_string(),
            }))
        }
        methods::TRACE_COMPLETE => Some(Routed::Net(NetEvent::TraceComplete)),
        methods::TARGET_NAVIGATED => Some(Routed::Navigated {
            url: str_field(params, "url").map(str::to_string),
        }),
        methods::TARGET_DESTROYED => Some(Routed::Gone {
            reason: "target destroyed",
        }),
        methods::TARGET_DETACHED => Some(Routed::Gone {
            reason: "externally detached",
        }),
        _ => None,
    }
}

fn str_field<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}
