use async_trait::async_trait;
use loadscope_core_types::TargetId;
use parking_lot::Mutex;
use thiserror::Error;

use crate::model::PageMetrics;

#[derive(Clone, Debug, Error)]
pub enum ProbeError {
    #[error("probe not present in target")]
    NotPresent,
    #[error("probe call failed: {0}")]
    Failed(String),
}

/// Request/response surface of the in-page probe.
#[async_trait]
pub trait PageProbe: Send + Sync {
    async fn start(&self, target: &TargetId) -> Result<(), ProbeError>;
    async fn stop(&self, target: &TargetId) -> Result<(), ProbeError>;
    /// `Ok(None)` means the probe answered but has nothing collected
    /// (or is absent from the page); both are valid outcomes.
    async fn snapshot(&self, target: &TargetId) -> Result<Option<PageMetrics>, ProbeError>;
}

/// Probe that is never present. Sessions run fine without page metrics;
/// the report just carries null timings.
pub struct NullProbe;

#[async_trait]
impl PageProbe for NullProbe {
    async fn start(&self, _target: &TargetId) -> Result<(), ProbeError> {
        Err(ProbeError::NotPresent)
    }

    async fn stop(&self, _target: &TargetId) -> Result<(), ProbeError> {
        Err(ProbeError::NotPresent)
    }

    async fn snapshot(&self, _target: &TargetId) -> Result<Option<PageMetrics>, ProbeError> {
        Ok(None)
    }
}

/// Probe returning a canned snapshot; failures are scriptable per call.
pub struct StaticProbe {
    metrics: Mutex<Option<PageMetrics>>,
    fail_start: Mutex<bool>,
    fail_stop: Mutex<bool>,
    fail_snapshot: Mutex<bool>,
}

impl StaticProbe {
    pub fn new(metrics: Option<PageMetrics>) -> Self {
        Self {
            metrics: Mutex::new(metrics),
            fail_start: Mutex::new(false),
            fail_stop: Mutex::new(false),
            fail_snapshot: Mutex::new(false),
        }
    }

    pub fn set_metrics(&self, metrics: Option<PageMetrics>) {
        *self.metrics.lock() = metrics;
    }

    pub fn fail_start(&self) {
        *self.fail_start.lock() = true;
    }

    pub fn fail_stop(&self) {
        *self.fail_stop.lock() = true;
    }

    pub fn fail_snapshot(&self) {
        *self.fail_snapshot.lock() = true;
    }
}

#[async_trait]
impl PageProbe for StaticProbe {
    async fn start(&self, _target: &TargetId) -> Result<(), ProbeError> {
        if *self.fail_start.lock() {
            return Err(ProbeError::Failed("start refused by stub".into()));
        }
        Ok(())
    }

    async fn stop(&self, _target: &TargetId) -> Result<(), ProbeError> {
        if *self.fail_stop.lock() {
            return Err(ProbeError::Failed("stop refused by stub".into()));
        }
        Ok(())
    }

    async fn snapshot(&self, _target: &TargetId) -> Result<Option<PageMetrics>, ProbeError> {
        if *self.fail_snapshot.lock() {
            return Err(ProbeError::Failed("snapshot refused by stub".into()));
        }
        Ok(self.metrics.lock().clone())
    }
}
