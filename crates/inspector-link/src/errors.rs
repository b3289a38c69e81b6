use std::fmt;

use thiserror::Error;

/// High-level error categories surfaced by a link implementation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum LinkErrorKind {
    #[error("attach failed")]
    AttachFailed,
    #[error("target is a protected context")]
    ProtectedTarget,
    #[error("command failed")]
    CommandFailed,
    #[error("link closed")]
    LinkClosed,
    #[error("internal error")]
    Internal,
}

/// Error passed back across the link boundary.
#[derive(Clone, Debug)]
pub struct LinkError {
    pub kind: LinkErrorKind,
    pub hint: Option<String>,
}

impl LinkError {
    pub fn new(kind: LinkErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for LinkError {}
