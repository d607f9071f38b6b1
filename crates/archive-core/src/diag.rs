//! Shared `tracing` field vocabulary: every component logs with the same
//! field names so a job's lines stay greppable across the whole pipeline.

use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

pub const FIELD_JOB: &str = "job";
pub const FIELD_TABLE: &str = "table";
pub const FIELD_ROOT_PK: &str = "root_pk";
pub const FIELD_PHASE: &str = "phase";
pub const FIELD_BATCH_INDEX: &str = "batch_index";

/// Checked at every I/O boundary and loop iteration (§5). Returns
/// `CoreError::Cancelled` the instant the token is observed cancelled, so
/// callers can propagate it verbatim rather than re-deriving the message.
pub fn check_cancelled(token: &CancellationToken, where_: &str) -> Result<(), CoreError> {
    if token.is_cancelled() {
        return Err(CoreError::Cancelled(where_.to_string()));
    }
    Ok(())
}
