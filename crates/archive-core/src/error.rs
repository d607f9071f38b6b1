use connectors::DbError;
use graph::GraphError;
use thiserror::Error;

/// One kind of schema precondition violated by the Preflight Checker
/// (§4.10). Fatal; the run aborts before any batch is fetched.
#[derive(Debug, Clone)]
pub struct PreflightError {
    pub check: &'static str,
    pub message: String,
    pub tables: Vec<String>,
    pub details: Vec<String>,
}

impl std::fmt::Display for PreflightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "preflight check '{}' failed: {} (tables: {:?})",
            self.check, self.message, self.tables
        )
    }
}

impl std::error::Error for PreflightError {}

/// Raised by the Resume Store (§4.8) when it cannot carry out a durable
/// bookkeeping operation.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("root PK {0} has no numeric checkpoint surrogate; the Resume Store persists root PKs as 64-bit integers (§9)")]
    NonNumericPk(String),

    #[error("malformed resume store row: {0}")]
    Malformed(String),
}

/// The kind of mismatch a Verifier found between source and destination
/// (§4.6). Carried inside `CoreError::VerificationMismatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    Count,
    Hash,
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchKind::Count => write!(f, "count"),
            MismatchKind::Hash => write!(f, "hash"),
        }
    }
}

/// The error surface shared by every pipeline component (§7): Root ID
/// Fetcher, Record Discovery, Copy Phase, Verifier, Delete Phase, Resume
/// Store, Lag Monitor, Preflight Checker. The Orchestrator's own
/// `ArchiveError` wraps this with per-root-PK context.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("dependency graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error(transparent)]
    Preflight(#[from] PreflightError),

    #[error(transparent)]
    Resume(#[from] ResumeError),

    #[error("verification mismatch on table '{table}': {kind} mismatch: {detail}")]
    VerificationMismatch {
        table: String,
        kind: MismatchKind,
        detail: String,
    },

    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl CoreError {
    pub fn db_context(self, table: &str, operation: &str) -> CoreError {
        match self {
            CoreError::Db(inner) => CoreError::Db(DbError::Unknown(format!(
                "{operation} on '{table}' failed: {inner}"
            ))),
            other => other,
        }
    }
}
