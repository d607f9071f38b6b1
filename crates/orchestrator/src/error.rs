use archive_core::CoreError;
use thiserror::Error;

/// Top-level error for one archive run, wrapping every component error at
/// the crate seam.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Malformed `JobSpec`, a cyclic graph, or a startup-time precondition
    /// such as replica monitoring enabled without a replica handle.
    #[error("job specification error: {0}")]
    Spec(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ArchiveError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ArchiveError::Core(CoreError::Cancelled(_)))
    }
}
