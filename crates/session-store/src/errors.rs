use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum StoreError {
    #[error("session already active for target")]
    AlreadyActive,
    #[error("no session for target")]
    NotFound,
}
