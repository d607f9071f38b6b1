use crate::{dialect::SqlDialect, error::DbError};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData, replication::ReplicationStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    MySql,
    Postgres,
}

/// One table's worth of already-fetched source rows, ready to be inserted
/// into the destination. Built by the Copy Phase from a source `SELECT *`;
/// every row's values line up positionally with `columns`.
#[derive(Debug, Clone)]
pub struct CopyTableOp {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Per-table rows-affected counters returned by `copy_all`, summed into the
/// orchestrator's run summary.
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    pub rows_by_table: HashMap<String, u64>,
}

impl CopyStats {
    pub fn total(&self) -> u64 {
        self.rows_by_table.values().sum()
    }
}

/// The one abstraction every component above it (Discovery, Copy, Verifier,
/// Delete, Resume Store, Lag Monitor, Preflight) is built against. Two
/// concrete backends implement it: MySQL and Postgres.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    fn kind(&self) -> DatabaseKind;
    fn dialect(&self) -> SqlDialect;

    /// Runs a statement that does not return rows (DDL, DELETE, UPDATE,
    /// single-row auto-commit INSERT). Returns rows affected where the
    /// backend reports it.
    async fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, DbError>;

    /// Runs a statement that returns rows (SELECT, SHOW).
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, DbError>;

    async fn table_exists(&self, table: &str) -> Result<bool, DbError>;
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// Executes the entire Copy Phase protocol (§4.5) against this adapter
    /// as the destination: one transaction spanning every table in `ops`,
    /// session `FOREIGN_KEY_CHECKS` toggled per `disable_fk_checks`,
    /// idempotent per-row inserts, single commit at the end. A failure at
    /// any point rolls back everything in `ops`.
    async fn copy_all(
        &self,
        ops: Vec<CopyTableOp>,
        disable_fk_checks: bool,
    ) -> Result<CopyStats, DbError>;

    /// Replica health (§4.9). `Err(DbError::Unsupported(_))` signals the
    /// backend has no replication-status concept (Postgres); the Lag
    /// Monitor treats that the same as "replication not configured."
    async fn replication_status(&self) -> Result<ReplicationStatus, DbError>;
}
