//! Copy Phase (§4.5): atomically re-inserts discovered rows into the
//! destination in parent-first order using idempotent inserts. The whole
//! `RecordSet` is copied inside one destination transaction.

use crate::{diag::check_cancelled, error::CoreError};
use connectors::{dialect::SqlDialect, CopyStats, CopyTableOp, SqlAdapter};
use graph::Graph;
use model::{core::value::Value, PkValue, RecordSet};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct CopyPhase {
    dialect: SqlDialect,
    chunk_size: usize,
}

impl CopyPhase {
    pub fn new(dialect: SqlDialect, chunk_size: usize) -> Self {
        CopyPhase {
            dialect,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Builds one `CopyTableOp` per table in `graph.copy_order()` that has
    /// PKs in `record_set`, fetching each table's rows from `source` via
    /// `SELECT * FROM {t} WHERE {pk} IN (...)` chunked to bound the `IN`
    /// clause, then hands all of them to `destination.copy_all` as a
    /// single transaction (§4.5 steps 1-4).
    pub async fn copy(
        &self,
        source: &dyn SqlAdapter,
        destination: &dyn SqlAdapter,
        graph: &Graph,
        record_set: &RecordSet,
        disable_fk_checks: bool,
        cancel: &CancellationToken,
    ) -> Result<CopyStats, CoreError> {
        let mut ops = Vec::new();

        for table in graph.copy_order() {
            check_cancelled(cancel, "copy.fetch")?;

            let pks = record_set.pks_for(&table);
            if pks.is_empty() {
                continue;
            }

            let Some(pk_col) = graph.pk_of(&table) else {
                continue;
            };

            let mut columns: Vec<String> = Vec::new();
            let mut rows: Vec<Vec<Value>> = Vec::new();

            for chunk in pks.chunks(self.chunk_size) {
                check_cancelled(cancel, "copy.fetch.chunk")?;

                let quoted_table = self.dialect.quote_safe(&table).map_err(CoreError::Db)?;
                let quoted_pk = self.dialect.quote_safe(pk_col).map_err(CoreError::Db)?;
                let placeholders = self.dialect.placeholders(0, chunk.len());
                let sql = format!("SELECT * FROM {quoted_table} WHERE {quoted_pk} IN ({placeholders})");
                let params: Vec<Value> = chunk.iter().map(PkValue::to_value).collect();

                let fetched = source
                    .query(&sql, &params)
                    .await
                    .map_err(|e| CoreError::Db(e).db_context(&table, "copy source fetch"))?;

                for row in fetched {
                    if columns.is_empty() {
                        columns = row.field_values.iter().map(|f| f.name.clone()).collect();
                    }
                    let values = columns
                        .iter()
                        .map(|col| row.get_value(col))
                        .collect::<Vec<_>>();
                    rows.push(values);
                }
            }

            if rows.is_empty() {
                continue;
            }

            debug!(table = %table, rows = rows.len(), "staged table for copy");
            ops.push(CopyTableOp {
                table: table.clone(),
                columns,
                rows,
            });
        }

        check_cancelled(cancel, "copy.commit")?;

        destination
            .copy_all(ops, disable_fk_checks)
            .await
            .map_err(|e| CoreError::Db(e).db_context("<copy transaction>", "copy commit"))
    }
}
