use serde::{Deserialize, Serialize};

/// Engine tuning knobs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long `stop` waits for trailing trace fragments after
    /// requesting trace end, when none were collected yet.
    pub trace_grace_ms: u64,
    /// Poll interval inside the grace wait.
    pub trace_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace_grace_ms: 750,
            trace_poll_ms: 25,
        }
    }
}
