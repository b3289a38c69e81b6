use lazy_static::lazy_static;
use prometheus::{core::Collector, IntGauge, Registry};
use tracing::error;

lazy_static! {
    static ref STORE_SESSIONS_LIVE: IntGauge = IntGauge::new(
        "loadscope_store_sessions_live",
        "Sessions currently registered in the store"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register store metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, STORE_SESSIONS_LIVE.clone());
}

pub fn set_session_count(count: usize) {
    STORE_SESSIONS_LIVE.set(count as i64);
}
