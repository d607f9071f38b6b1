//! Delete Phase (§4.7): deletes discovered rows from the source in
//! child-first order, auto-commit per batch. Deliberately not wrapped in
//! a transaction — keeps locks short and tolerates partial progress,
//! because the preceding copy is idempotent and so is this delete.

use std::collections::HashMap;

use crate::{diag::check_cancelled, error::CoreError};
use connectors::{dialect::SqlDialect, SqlAdapter};
use graph::Graph;
use model::{core::value::Value, PkValue, RecordSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct DeleteStats {
    pub rows_by_table: HashMap<String, u64>,
}

impl DeleteStats {
    pub fn total(&self) -> u64 {
        self.rows_by_table.values().sum()
    }
}

pub struct DeletePhase {
    dialect: SqlDialect,
    batch_delete_size: usize,
}

impl DeletePhase {
    pub fn new(dialect: SqlDialect, batch_delete_size: usize) -> Self {
        DeletePhase {
            dialect,
            batch_delete_size: batch_delete_size.max(1),
        }
    }

    pub async fn delete(
        &self,
        source: &dyn SqlAdapter,
        graph: &Graph,
        record_set: &RecordSet,
        cancel: &CancellationToken,
    ) -> Result<DeleteStats, CoreError> {
        let mut stats = DeleteStats::default();

        for table in graph.delete_order() {
            let pks = record_set.pks_for(&table);
            if pks.is_empty() {
                continue;
            }

            let Some(pk_col) = graph.pk_of(&table) else {
                continue;
            };

            let mut deleted = 0u64;
            for chunk in pks.chunks(self.batch_delete_size) {
                check_cancelled(cancel, "delete.chunk")?;

                let quoted_table = self.dialect.quote_safe(&table).map_err(CoreError::Db)?;
                let quoted_pk = self.dialect.quote_safe(pk_col).map_err(CoreError::Db)?;
                let placeholders = self.dialect.placeholders(0, chunk.len());
                let sql = format!("DELETE FROM {quoted_table} WHERE {quoted_pk} IN ({placeholders})");
                let params: Vec<Value> = chunk.iter().map(PkValue::to_value).collect();

                let affected = source
                    .exec(&sql, &params)
                    .await
                    .map_err(|e| CoreError::Db(e).db_context(&table, "delete"))?;

                if affected == 0 {
                    debug!(table = %table, chunk_size = chunk.len(), "delete batch affected zero rows");
                } else if (affected as usize) < chunk.len() {
                    warn!(
                        table = %table,
                        requested = chunk.len(),
                        affected,
                        "delete batch affected fewer rows than requested; rows were likely already deleted by a previous run"
                    );
                }

                deleted += affected;
            }

            stats.rows_by_table.insert(table, deleted);
        }

        Ok(stats)
    }
}
