//! Root ID Fetcher (§4.3): pages through root-table primary keys matching
//! the job's predicate, in ascending key order, using a checkpoint cursor.

use crate::{diag::check_cancelled, error::CoreError};
use connectors::{dialect::SqlDialect, SqlAdapter};
use model::{core::value::Value, PkValue};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct RootIdFetcher {
    table: String,
    pk_column: String,
    predicate: String,
    batch_size: u32,
    dialect: SqlDialect,
    checkpoint: PkValue,
}

impl RootIdFetcher {
    pub fn new(
        table: impl Into<String>,
        pk_column: impl Into<String>,
        predicate: Option<String>,
        batch_size: u32,
        dialect: SqlDialect,
        initial_checkpoint: Option<PkValue>,
    ) -> Self {
        RootIdFetcher {
            table: table.into(),
            pk_column: pk_column.into(),
            predicate: predicate.unwrap_or_else(|| "1=1".to_string()),
            batch_size,
            dialect,
            checkpoint: initial_checkpoint.unwrap_or(PkValue::Int(0)),
        }
    }

    pub fn checkpoint(&self) -> &PkValue {
        &self.checkpoint
    }

    pub fn update_checkpoint(&mut self, last_pk: PkValue) {
        self.checkpoint = last_pk;
    }

    /// Emits `SELECT {pk} FROM {table} WHERE ({predicate}) AND {pk} > ?
    /// ORDER BY {pk} ASC LIMIT ?` (§6.2). Empty result signals "no more
    /// work." Byte-array scalars are coerced to text by `DbRow::get_value`
    /// upstream; integer scalars pass through unchanged.
    pub async fn fetch_next_batch(
        &self,
        adapter: &dyn SqlAdapter,
        cancel: &CancellationToken,
    ) -> Result<Vec<PkValue>, CoreError> {
        check_cancelled(cancel, "root_fetcher.fetch_next_batch")?;

        let quoted_pk = self
            .dialect
            .quote_safe(&self.pk_column)
            .map_err(CoreError::Db)?;
        let quoted_table = self
            .dialect
            .quote_safe(&self.table)
            .map_err(CoreError::Db)?;

        let sql = format!(
            "SELECT {quoted_pk} FROM {quoted_table} WHERE ({}) AND {quoted_pk} > {} ORDER BY {quoted_pk} ASC LIMIT {}",
            self.predicate,
            self.dialect.placeholder(0),
            self.dialect.placeholder(1),
        );

        let params = [self.checkpoint.to_value(), Value::Int(self.batch_size as i64)];
        let rows = adapter
            .query(&sql, &params)
            .await
            .map_err(|e| CoreError::Db(e).db_context(&self.table, "root id fetch"))?;

        let pks: Vec<PkValue> = rows
            .iter()
            .filter_map(|row| PkValue::from_value(&row.get_value(&self.pk_column)))
            .collect();

        debug!(table = %self.table, count = pks.len(), "fetched root id batch");
        Ok(pks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_defaults_to_zero_when_none_supplied() {
        let fetcher = RootIdFetcher::new("customers", "id", None, 500, SqlDialect::MySql, None);
        assert_eq!(fetcher.checkpoint(), &PkValue::Int(0));
    }

    #[test]
    fn missing_predicate_falls_back_to_tautology() {
        let fetcher = RootIdFetcher::new("customers", "id", None, 500, SqlDialect::MySql, None);
        assert_eq!(fetcher.predicate, "1=1");
    }

    #[test]
    fn update_checkpoint_advances_cursor() {
        let mut fetcher = RootIdFetcher::new("customers", "id", None, 500, SqlDialect::MySql, None);
        fetcher.update_checkpoint(PkValue::Int(42));
        assert_eq!(fetcher.checkpoint(), &PkValue::Int(42));
    }
}
