use crate::{
    adapter::{CopyStats, CopyTableOp, DatabaseKind, SqlAdapter},
    dialect::SqlDialect,
    error::{ConnectorError, DbError},
    mysql::params::to_params,
    row::DbRow,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData, replication::ReplicationStatus};
use mysql_async::{prelude::Queryable, Pool, Row as MySqlRow};
use tracing::warn;

#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
}

impl MySqlAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let pool = Pool::from_url(url)?;
        Ok(MySqlAdapter { pool })
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MySql
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let result = conn.exec_iter(sql, to_params(params)).await?;
        Ok(result.affected_rows())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<MySqlRow> = conn.exec(sql, to_params(params)).await?;
        Ok(rows.iter().map(|row| DbRow::MySql(row).to_row_data("")).collect())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let row: Option<(i64,)> = conn
            .exec_first(
                "SELECT COUNT(*) FROM information_schema.TABLES WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
                (table,),
            )
            .await?;
        Ok(row.map(|r| r.0 > 0).unwrap_or(false))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<MySqlRow> = conn.query("SHOW TABLES").await?;
        rows.into_iter()
            .map(|row| {
                row.get_opt::<String, _>(0)
                    .and_then(Result::ok)
                    .ok_or_else(|| DbError::Unknown("failed to read table name".to_string()))
            })
            .collect()
    }

    async fn copy_all(
        &self,
        ops: Vec<CopyTableOp>,
        disable_fk_checks: bool,
    ) -> Result<CopyStats, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let mut tx = conn.start_transaction(Default::default()).await?;

        if disable_fk_checks {
            tx.query_drop("SET FOREIGN_KEY_CHECKS=0").await?;
        }

        let mut stats = CopyStats::default();
        for op in &ops {
            let cols = op
                .columns
                .iter()
                .map(|c| SqlDialect::MySql.quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = SqlDialect::MySql.placeholders(0, op.columns.len());
            let sql = format!(
                "INSERT IGNORE INTO {} ({cols}) VALUES ({placeholders})",
                SqlDialect::MySql.quote(&op.table)
            );

            let mut affected = 0u64;
            for row in &op.rows {
                match tx.exec_iter(sql.as_str(), to_params(row)).await {
                    Ok(result) => affected += result.affected_rows(),
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback().await {
                            warn!(error = %rollback_err, "rollback failed after copy error");
                        }
                        return Err(DbError::from(err));
                    }
                }
            }
            stats.rows_by_table.insert(op.table.clone(), affected);
        }

        tx.commit().await?;
        Ok(stats)
    }

    async fn replication_status(&self) -> Result<ReplicationStatus, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<MySqlRow> = match conn.query("SHOW REPLICA STATUS").await {
            Ok(rows) => rows,
            Err(_) => conn.query("SHOW SLAVE STATUS").await?,
        };

        let Some(row) = rows.into_iter().next() else {
            return Ok(ReplicationStatus::default());
        };

        let db_row = DbRow::MySql(&row);
        let seconds_behind_primary = db_row
            .try_get_i64("Seconds_Behind_Source")
            .or_else(|| db_row.try_get_i64("Seconds_Behind_Master"));
        let io_thread_running = db_row
            .try_get_string("Source_IO_Running")
            .or_else(|| db_row.try_get_string("Slave_IO_Running"))
            .map(|v| v.eq_ignore_ascii_case("yes"));
        let sql_thread_running = db_row
            .try_get_string("Source_SQL_Running")
            .or_else(|| db_row.try_get_string("Slave_SQL_Running"))
            .map(|v| v.eq_ignore_ascii_case("yes"));
        let last_error = db_row
            .try_get_string("Last_IO_Error")
            .filter(|s| !s.is_empty())
            .or_else(|| db_row.try_get_string("Last_SQL_Error").filter(|s| !s.is_empty()));

        Ok(ReplicationStatus {
            seconds_behind_primary,
            io_thread_running,
            sql_thread_running,
            last_error,
        })
    }
}
