use serde::Serialize;

/// One foreign key constraint as seen from `information_schema`, used by
/// both Record Discovery (to walk the graph) and the Preflight Checker
/// (checks 3 and 4 of §4.10).
#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyMetadata {
    pub constraint_name: String,
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// A `DELETE` trigger found on a graph table — preflight check 5.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerMetadata {
    pub table: String,
    pub trigger_name: String,
    pub event: String,
}
