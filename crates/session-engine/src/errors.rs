use inspector_link::LinkError;
use thiserror::Error;

/// Failures surfaced to the caller. Everything downstream of a
/// successful channel enable degrades instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session already active for target")]
    AlreadyActive,
    #[error("no active session for target")]
    NoActiveSession,
    #[error("target is a protected context")]
    ProtectedTarget,
    #[error("inspector attach failed: {0}")]
    Attach(LinkError),
    #[error("network channel enable failed: {0}")]
    ChannelEnable(LinkError),
}
