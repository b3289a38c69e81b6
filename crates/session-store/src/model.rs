use chrono::{DateTime, Utc};
use loadscope_core_types::{Degradation, SessionOptions, TargetId};
use network_rollup::NetworkState;

/// One live measurement session, owned by the store while active.
///
/// Mutated only by events addressed to its target; destroyed at `stop`
/// or at forced cleanup.
#[derive(Debug)]
pub struct Session {
    pub target: TargetId,
    pub started_at: DateTime<Utc>,
    pub options: SessionOptions,
    /// Page URL, best-effort; `None` when the target never told us.
    pub page_url: Option<String>,
    pub network: NetworkState,
    degradations: Vec<Degradation>,
    stopping: bool,
}

impl Session {
    pub fn new(target: TargetId, options: SessionOptions) -> Self {
        Self {
            target,
            started_at: Utc::now(),
            options,
            page_url: None,
            network: NetworkState::new(options.trace_enabled),
            degradations: Vec::new(),
            stopping: false,
        }
    }

    /// Record a best-effort step that ran at reduced fidelity.
    pub fn degrade(&mut self, degradation: Degradation) {
        if !self.degradations.contains(&degradation) {
            self.degradations.push(degradation);
        }
    }

    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// One-way stopping latch. Returns `true` for the caller that wins
    /// the transition; every later caller sees `false`.
    pub fn begin_stop(&mut self) -> bool {
        if self.stopping {
            return false;
        }
        self.stopping = true;
        true
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_latch_fires_once() {
        let mut session = Session::new(TargetId::new(), SessionOptions::default());
        assert!(session.begin_stop());
        assert!(!session.begin_stop());
        assert!(session.is_stopping());
    }

    #[test]
    fn degradations_deduplicate() {
        let mut session = Session::new(TargetId::new(), SessionOptions::default());
        session.degrade(Degradation::ProbeStartFailed);
        session.degrade(Degradation::ProbeStartFailed);
        assert_eq!(session.degradations().len(), 1);
    }
}
