use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use loadscope_core_types::{SessionOptions, TargetId};
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::StoreError;
use crate::metrics;
use crate::model::Session;

/// Target → session map. `create` is atomic: the dashmap entry API
/// makes the existence check and the insert one operation, so no two
/// sessions can ever exist for the same target.
pub struct SessionStore {
    sessions: DashMap<TargetId, Arc<RwLock<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn create(
        &self,
        target: &TargetId,
        options: SessionOptions,
    ) -> Result<Arc<RwLock<Session>>, StoreError> {
        match self.sessions.entry(target.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyActive),
            Entry::Vacant(slot) => {
                let session = Arc::new(RwLock::new(Session::new(target.clone(), options)));
                slot.insert(Arc::clone(&session));
                metrics::set_session_count(self.sessions.len());
                debug!(%target, "session registered");
                Ok(session)
            }
        }
    }

    pub fn get(&self, target: &TargetId) -> Option<Arc<RwLock<Session>>> {
        self.sessions
            .get(target)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, target: &TargetId) -> Option<Arc<RwLock<Session>>> {
        let removed = self.sessions.remove(target).map(|(_, session)| session);
        if removed.is_some() {
            metrics::set_session_count(self.sessions.len());
            debug!(%target, "session removed");
        }
        removed
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.sessions.contains_key(target)
    }

    pub fn targets(&self) -> Vec<TargetId> {
        self.sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
