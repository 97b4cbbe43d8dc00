/// Error kinds surfaced by the scheduling core.
///
/// `Validation` and `NotFound` are expected, recoverable outcomes the
/// caller translates into user-facing messages. `AlreadyExists` is raised
/// by direct structure inserts only, never by the idempotent `upsert`.
/// `Invariant` marks an internal desync between the three structures; it
/// indicates a bug, not bad input, and is logged before being returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl SchedulerError {
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}
