//! Bounded per-origin report history.
//!
//! The core only ever appends and reads; the cap is enforced at write
//! time by dropping the oldest entry. Reports are stored newest first.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use run_report::RunReport;
use thiserror::Error;
use tracing::debug;

/// Reports retained per origin key.
pub const HISTORY_CAP: usize = 10;

#[derive(Clone, Debug, Error)]
pub enum HistoryError {
    #[error("history backend unavailable: {0}")]
    Unavailable(String),
}

/// Append/read surface of the history collaborator.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, origin: &str, report: RunReport) -> Result<(), HistoryError>;
    /// Newest first; empty when the origin was never measured.
    async fn read(&self, origin: &str) -> Result<Vec<RunReport>, HistoryError>;
}

/// In-memory implementation backing tests and the replay harness.
pub struct InMemoryHistory {
    entries: DashMap<String, Mutex<VecDeque<RunReport>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append(&self, origin: &str, report: RunReport) -> Result<(), HistoryError> {
        let ring = self
            .entries
            .entry(origin.to_string())
            .or_insert_with(|| Mutex::new(VecDeque::with_capacity(HISTORY_CAP)));
        let mut guard = ring.lock();
        if guard.len() >= HISTORY_CAP {
            guard.pop_back();
            debug!(origin, "history cap reached, oldest report dropped");
        }
        guard.push_front(report);
        Ok(())
    }

    async fn read(&self, origin: &str) -> Result<Vec<RunReport>, HistoryError> {
        Ok(self
            .entries
            .get(origin)
            .map(|ring| ring.lock().iter().cloned().collect())
            .unwrap_or_default())
    }
}
