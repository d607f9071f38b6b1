//! In-memory `SqlAdapter` fakes for scenarios that exercise component
//! logic (Scenario E's lag backpressure) without needing a real replica.

use async_trait::async_trait;
use connectors::{dialect::SqlDialect, CopyStats, CopyTableOp, DatabaseKind, DbError, SqlAdapter};
use model::{core::value::Value, records::row::RowData, ReplicationStatus};
use std::sync::Mutex;

/// Reports a fixed sequence of replication statuses, one per call to
/// `replication_status`, then repeats the last entry forever.
pub struct ScriptedReplicaAdapter {
    probes: Mutex<Vec<ReplicationStatus>>,
    cursor: Mutex<usize>,
}

impl ScriptedReplicaAdapter {
    pub fn new(probes: Vec<ReplicationStatus>) -> Self {
        ScriptedReplicaAdapter {
            probes: Mutex::new(probes),
            cursor: Mutex::new(0),
        }
    }

    pub fn probes_consumed(&self) -> usize {
        *self.cursor.lock().unwrap()
    }
}

#[async_trait]
impl SqlAdapter for ScriptedReplicaAdapter {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    async fn exec(&self, _sql: &str, _params: &[Value]) -> Result<u64, DbError> {
        Ok(0)
    }

    async fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<RowData>, DbError> {
        Ok(vec![])
    }

    async fn table_exists(&self, _table: &str) -> Result<bool, DbError> {
        Ok(true)
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        Ok(vec![])
    }

    async fn copy_all(&self, _ops: Vec<CopyTableOp>, _disable_fk_checks: bool) -> Result<CopyStats, DbError> {
        Ok(CopyStats::default())
    }

    async fn replication_status(&self) -> Result<ReplicationStatus, DbError> {
        let probes = self.probes.lock().unwrap();
        let mut cursor = self.cursor.lock().unwrap();
        let index = (*cursor).min(probes.len() - 1);
        *cursor += 1;
        Ok(probes[index].clone())
    }
}
