use thiserror::Error;

/// Graph construction and ordering is pure and in-memory; failures here are
/// fatal to the job and never retried (§4.1).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cycle detected in dependency graph, unprocessed tables: {0:?}")]
    CycleDetected(Vec<String>),

    #[error("invalid job spec: {0}")]
    InvalidSpec(String),
}
