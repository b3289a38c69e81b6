use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, Registry};
use tracing::error;

lazy_static! {
    static ref ENGINE_SESSIONS_STARTED: IntCounter = IntCounter::new(
        "loadscope_engine_sessions_started_total",
        "Sessions successfully started"
    )
    .unwrap();
    static ref ENGINE_SESSIONS_STOPPED: IntCounter = IntCounter::new(
        "loadscope_engine_sessions_stopped_total",
        "Sessions stopped with a report produced"
    )
    .unwrap();
    static ref ENGINE_FORCED_CLEANUPS: IntCounter = IntCounter::new(
        "loadscope_engine_forced_cleanups_total",
        "Sessions torn down by target loss or navigation"
    )
    .unwrap();
    static ref ENGINE_LINK_EVENTS: IntCounter = IntCounter::new(
        "loadscope_engine_link_events_total",
        "Link events handled by the dispatcher"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register engine metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, ENGINE_SESSIONS_STARTED.clone());
    register(registry, ENGINE_SESSIONS_STOPPED.clone());
    register(registry, ENGINE_FORCED_CLEANUPS.clone());
    register(registry, ENGINE_LINK_EVENTS.clone());
}

pub fn record_session_started() {
    ENGINE_SESSIONS_STARTED.inc();
}

pub fn record_session_stopped() {
    ENGINE_SESSIONS_STOPPED.inc();
}

pub fn record_forced_cleanup() {
    ENGINE_FORCED_CLEANUPS.inc();
}

pub fn record_link_event() {
    ENGINE_LINK_EVENTS.inc();
}
