//! Verifier (§4.6): compares source vs destination for each copied table
//! using either row-count or a deterministic row-hash, before the Delete
//! Phase is allowed to run for a root PK.

use crate::{
    diag::check_cancelled,
    error::{CoreError, MismatchKind},
};
use connectors::{dialect::SqlDialect, SqlAdapter};
use graph::Graph;
use model::{core::value::Value, PkValue, RecordSet, VerificationMethod};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct VerifyStats {
    pub tables_verified: usize,
    pub rows_verified: u64,
}

pub struct Verifier {
    method: VerificationMethod,
    dialect: SqlDialect,
    chunk_size: usize,
}

impl Verifier {
    pub fn new(method: VerificationMethod, dialect: SqlDialect, chunk_size: usize) -> Self {
        Verifier {
            method,
            dialect,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn verify(
        &self,
        source: &dyn SqlAdapter,
        destination: &dyn SqlAdapter,
        graph: &Graph,
        record_set: &RecordSet,
        cancel: &CancellationToken,
    ) -> Result<VerifyStats, CoreError> {
        if matches!(self.method, VerificationMethod::Skip) {
            return Ok(VerifyStats::default());
        }

        let mut stats = VerifyStats::default();

        for table in graph.copy_order() {
            let pks = record_set.pks_for(&table);
            if pks.is_empty() {
                continue;
            }
            check_cancelled(cancel, "verify.table")?;

            let Some(pk_col) = graph.pk_of(&table).map(str::to_string) else {
                continue;
            };

            match self.method {
                VerificationMethod::Count => {
                    self.verify_count(source, destination, &table, &pk_col, pks, cancel).await?;
                }
                VerificationMethod::Sha256 => {
                    self.verify_hash(source, destination, &table, &pk_col, pks, cancel).await?;
                }
                VerificationMethod::Skip => unreachable!(),
            }

            stats.tables_verified += 1;
            stats.rows_verified += pks.len() as u64;
        }

        Ok(stats)
    }

    async fn verify_count(
        &self,
        source: &dyn SqlAdapter,
        destination: &dyn SqlAdapter,
        table: &str,
        pk_col: &str,
        pks: &[PkValue],
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let src_count = self.count(source, table, pk_col, pks, cancel).await?;
        let dst_count = self.count(destination, table, pk_col, pks, cancel).await?;

        if src_count != dst_count {
            return Err(CoreError::VerificationMismatch {
                table: table.to_string(),
                kind: MismatchKind::Count,
                detail: format!("source={src_count}, dest={dst_count}"),
            });
        }
        Ok(())
    }

    async fn count(
        &self,
        adapter: &dyn SqlAdapter,
        table: &str,
        pk_col: &str,
        pks: &[PkValue],
        cancel: &CancellationToken,
    ) -> Result<i64, CoreError> {
        check_cancelled(cancel, "verify.count")?;

        let quoted_table = self.dialect.quote_safe(table).map_err(CoreError::Db)?;
        let quoted_pk = self.dialect.quote_safe(pk_col).map_err(CoreError::Db)?;
        let placeholders = self.dialect.placeholders(0, pks.len());
        let sql = format!("SELECT COUNT(*) FROM {quoted_table} WHERE {quoted_pk} IN ({placeholders})");
        let params: Vec<Value> = pks.iter().map(PkValue::to_value).collect();

        let rows = adapter
            .query(&sql, &params)
            .await
            .map_err(|e| CoreError::Db(e).db_context(table, "verify count"))?;

        Ok(rows
            .first()
            .and_then(|r| r.field_values.first())
            .and_then(|f| f.value.as_ref())
            .and_then(Value::as_i64)
            .unwrap_or(0))
    }

    async fn verify_hash(
        &self,
        source: &dyn SqlAdapter,
        destination: &dyn SqlAdapter,
        table: &str,
        pk_col: &str,
        pks: &[PkValue],
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let (src_hash, src_count) = self.hash_table(source, table, pk_col, pks, cancel).await?;
        let (dst_hash, dst_count) = self.hash_table(destination, table, pk_col, pks, cancel).await?;

        if src_count != dst_count {
            return Err(CoreError::VerificationMismatch {
                table: table.to_string(),
                kind: MismatchKind::Count,
                detail: format!("source={src_count}, dest={dst_count}"),
            });
        }
        if src_hash != dst_hash {
            return Err(CoreError::VerificationMismatch {
                table: table.to_string(),
                kind: MismatchKind::Hash,
                detail: format!("source={src_hash}, dest={dst_hash}"),
            });
        }
        Ok(())
    }

    /// Computes the canonical row hash (§4.6): chunks the PK list, fetches
    /// each chunk ordered by PK, serializes every row as
    /// `col1=val1\x00col2=val2…\n` using `Value::hash_encode`, and feeds
    /// the bytes into a running SHA-256 accumulator. Deterministic
    /// regardless of chunk size.
    async fn hash_table(
        &self,
        adapter: &dyn SqlAdapter,
        table: &str,
        pk_col: &str,
        pks: &[PkValue],
        cancel: &CancellationToken,
    ) -> Result<(String, u64), CoreError> {
        let mut hasher = Sha256::new();
        let mut row_count = 0u64;

        let quoted_table = self.dialect.quote_safe(table).map_err(CoreError::Db)?;
        let quoted_pk = self.dialect.quote_safe(pk_col).map_err(CoreError::Db)?;

        for chunk in pks.chunks(self.chunk_size) {
            check_cancelled(cancel, "verify.hash.chunk")?;

            let placeholders = self.dialect.placeholders(0, chunk.len());
            let sql = format!(
                "SELECT * FROM {quoted_table} WHERE {quoted_pk} IN ({placeholders}) ORDER BY {quoted_pk}"
            );
            let params: Vec<Value> = chunk.iter().map(PkValue::to_value).collect();

            let rows = adapter
                .query(&sql, &params)
                .await
                .map_err(|e| CoreError::Db(e).db_context(table, "verify hash fetch"))?;

            for row in rows {
                check_cancelled(cancel, "verify.hash.row")?;
                let mut parts = Vec::with_capacity(row.field_values.len());
                for field in &row.field_values {
                    let encoded = field
                        .value
                        .as_ref()
                        .map(Value::hash_encode)
                        .unwrap_or_else(|| "NULL".to_string());
                    parts.push(format!("{}={}", field.name, encoded));
                }
                let line = parts.join("\x00");
                hasher.update(line.as_bytes());
                hasher.update(b"\n");
                row_count += 1;
            }
        }

        Ok((format!("{:x}", hasher.finalize()), row_count))
    }
}
