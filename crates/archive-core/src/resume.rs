//! Resume Store (§4.8): persists per-job checkpoint and per-root-PK log
//! (`pending`/`completed`/`failed`) in the destination database, behind
//! two idempotently-created tables (§6.1).

use crate::error::{CoreError, ResumeError};
use chrono::Utc;
use connectors::{dialect::SqlDialect, SqlAdapter};
use model::{
    core::value::Value, JobLogStats, JobState, JobStatus, LogStatus, PkValue,
};
use tracing::debug;

pub struct ResumeStore<'a> {
    adapter: &'a dyn SqlAdapter,
    dialect: SqlDialect,
}

impl<'a> ResumeStore<'a> {
    pub fn new(adapter: &'a dyn SqlAdapter) -> Self {
        ResumeStore {
            adapter,
            dialect: adapter.dialect(),
        }
    }

    fn pk_as_i64(pk: &PkValue) -> Result<i64, CoreError> {
        pk.as_checkpoint()
            .ok_or_else(|| CoreError::Resume(ResumeError::NonNumericPk(pk.to_string())))
    }

    pub async fn init_tables(&self) -> Result<(), CoreError> {
        let job_ddl = match self.dialect {
            SqlDialect::MySql => {
                "CREATE TABLE IF NOT EXISTS archive_job (
                    job_name VARCHAR(255) PRIMARY KEY,
                    root_table VARCHAR(255) NOT NULL,
                    last_processed_root_pk BIGINT NOT NULL DEFAULT 0,
                    status TINYINT NOT NULL DEFAULT 0,
                    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                ) ENGINE=InnoDB"
            }
            SqlDialect::Postgres => {
                "CREATE TABLE IF NOT EXISTS archive_job (
                    job_name TEXT PRIMARY KEY,
                    root_table TEXT NOT NULL,
                    last_processed_root_pk BIGINT NOT NULL DEFAULT 0,
                    status SMALLINT NOT NULL DEFAULT 0,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )"
            }
        };

        let log_ddl = match self.dialect {
            SqlDialect::MySql => {
                "CREATE TABLE IF NOT EXISTS archive_job_log (
                    id BIGINT AUTO_INCREMENT PRIMARY KEY,
                    job_name VARCHAR(255) NOT NULL,
                    root_pk BIGINT NOT NULL,
                    status ENUM('pending','completed','failed') NOT NULL,
                    error_message TEXT,
                    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE KEY uq_archive_job_log_job_root (job_name, root_pk),
                    CONSTRAINT fk_archive_job_log_job FOREIGN KEY (job_name)
                        REFERENCES archive_job(job_name) ON DELETE CASCADE
                ) ENGINE=InnoDB"
            }
            SqlDialect::Postgres => {
                "CREATE TABLE IF NOT EXISTS archive_job_log (
                    id BIGSERIAL PRIMARY KEY,
                    job_name TEXT NOT NULL REFERENCES archive_job(job_name) ON DELETE CASCADE,
                    root_pk BIGINT NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('pending','completed','failed')),
                    error_message TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    UNIQUE (job_name, root_pk)
                )"
            }
        };

        self.adapter.exec(job_ddl, &[]).await.map_err(CoreError::Db)?;
        self.adapter.exec(log_ddl, &[]).await.map_err(CoreError::Db)?;
        Ok(())
    }

    pub async fn get_or_create_job(
        &self,
        job_name: &str,
        root_table: &str,
    ) -> Result<JobState, CoreError> {
        let select = "SELECT job_name, root_table, last_processed_root_pk, status, created_at, updated_at \
                       FROM archive_job WHERE job_name = $p0"
            .replace("$p0", &self.dialect.placeholder(0));

        let rows = self
            .adapter
            .query(&select, &[Value::String(job_name.to_string())])
            .await
            .map_err(CoreError::Db)?;

        if let Some(row) = rows.into_iter().next() {
            return Ok(JobState {
                job_name: row.get_value("job_name").as_string().unwrap_or_default(),
                root_table: row.get_value("root_table").as_string().unwrap_or_default(),
                last_processed_root_pk: row.get_value("last_processed_root_pk").as_i64().unwrap_or(0),
                status: JobStatus::from_code(
                    row.get_value("status").as_i64().unwrap_or(0) as i16,
                )
                .unwrap_or(JobStatus::Idle),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }

        let now = Utc::now();
        let insert = format!(
            "INSERT INTO archive_job (job_name, root_table, last_processed_root_pk, status, created_at, updated_at) \
             VALUES ({}, {}, {}, {}, {}, {})",
            self.dialect.placeholder(0),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
            self.dialect.placeholder(3),
            self.dialect.placeholder(4),
            self.dialect.placeholder(5),
        );
        self.adapter
            .exec(
                &insert,
                &[
                    Value::String(job_name.to_string()),
                    Value::String(root_table.to_string()),
                    Value::Int(0),
                    Value::Int(JobStatus::Idle.as_code() as i64),
                    Value::Timestamp(now),
                    Value::Timestamp(now),
                ],
            )
            .await
            .map_err(CoreError::Db)?;

        Ok(JobState {
            job_name: job_name.to_string(),
            root_table: root_table.to_string(),
            last_processed_root_pk: 0,
            status: JobStatus::Idle,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn update_status(&self, job_name: &str, status: JobStatus) -> Result<(), CoreError> {
        let sql = format!(
            "UPDATE archive_job SET status = {}, updated_at = {} WHERE job_name = {}",
            self.dialect.placeholder(0),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
        );
        self.adapter
            .exec(
                &sql,
                &[
                    Value::Int(status.as_code() as i64),
                    Value::Timestamp(Utc::now()),
                    Value::String(job_name.to_string()),
                ],
            )
            .await
            .map_err(CoreError::Db)?;
        Ok(())
    }

    pub async fn update_checkpoint(&self, job_name: &str, last_pk: &PkValue) -> Result<(), CoreError> {
        let numeric = Self::pk_as_i64(last_pk)?;
        let sql = format!(
            "UPDATE archive_job SET last_processed_root_pk = {}, updated_at = {} WHERE job_name = {}",
            self.dialect.placeholder(0),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
        );
        self.adapter
            .exec(
                &sql,
                &[
                    Value::Int(numeric),
                    Value::Timestamp(Utc::now()),
                    Value::String(job_name.to_string()),
                ],
            )
            .await
            .map_err(CoreError::Db)?;
        Ok(())
    }

    pub async fn log_batch_pending(&self, job_name: &str, pks: &[PkValue]) -> Result<(), CoreError> {
        for pk in pks {
            let numeric = Self::pk_as_i64(pk)?;
            let now = Utc::now();
            let sql = match self.dialect {
                SqlDialect::MySql => format!(
                    "INSERT IGNORE INTO archive_job_log (job_name, root_pk, status, created_at, updated_at) \
                     VALUES ({}, {}, 'pending', {}, {})",
                    self.dialect.placeholder(0),
                    self.dialect.placeholder(1),
                    self.dialect.placeholder(2),
                    self.dialect.placeholder(3),
                ),
                SqlDialect::Postgres => format!(
                    "INSERT INTO archive_job_log (job_name, root_pk, status, created_at, updated_at) \
                     VALUES ({}, {}, 'pending', {}, {}) ON CONFLICT (job_name, root_pk) DO NOTHING",
                    self.dialect.placeholder(0),
                    self.dialect.placeholder(1),
                    self.dialect.placeholder(2),
                    self.dialect.placeholder(3),
                ),
            };
            self.adapter
                .exec(
                    &sql,
                    &[
                        Value::String(job_name.to_string()),
                        Value::Int(numeric),
                        Value::Timestamp(now),
                        Value::Timestamp(now),
                    ],
                )
                .await
                .map_err(CoreError::Db)?;
        }
        debug!(job = job_name, count = pks.len(), "logged batch pending");
        Ok(())
    }

    async fn set_log_status(
        &self,
        job_name: &str,
        pk: &PkValue,
        status: LogStatus,
        error_message: Option<&str>,
    ) -> Result<(), CoreError> {
        let numeric = Self::pk_as_i64(pk)?;
        let sql = format!(
            "UPDATE archive_job_log SET status = {}, error_message = {}, updated_at = {} \
             WHERE job_name = {} AND root_pk = {}",
            self.dialect.placeholder(0),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
            self.dialect.placeholder(3),
            self.dialect.placeholder(4),
        );
        self.adapter
            .exec(
                &sql,
                &[
                    Value::String(status.as_str().to_string()),
                    error_message
                        .map(|m| Value::String(m.to_string()))
                        .unwrap_or(Value::Null),
                    Value::Timestamp(Utc::now()),
                    Value::String(job_name.to_string()),
                    Value::Int(numeric),
                ],
            )
            .await
            .map_err(CoreError::Db)?;
        Ok(())
    }

    pub async fn mark_completed(&self, job_name: &str, pk: &PkValue) -> Result<(), CoreError> {
        self.set_log_status(job_name, pk, LogStatus::Completed, None).await
    }

    pub async fn mark_failed(&self, job_name: &str, pk: &PkValue, error: &str) -> Result<(), CoreError> {
        self.set_log_status(job_name, pk, LogStatus::Failed, Some(error)).await
    }

    pub async fn get_pending(&self, job_name: &str) -> Result<Vec<PkValue>, CoreError> {
        let sql = format!(
            "SELECT root_pk FROM archive_job_log WHERE job_name = {} AND status = 'pending' ORDER BY root_pk ASC",
            self.dialect.placeholder(0),
        );
        let rows = self
            .adapter
            .query(&sql, &[Value::String(job_name.to_string())])
            .await
            .map_err(CoreError::Db)?;

        Ok(rows
            .iter()
            .filter_map(|r| r.get_value("root_pk").as_i64().map(PkValue::Int))
            .collect())
    }

    pub async fn checkpoint(&self, job_name: &str) -> Result<Option<i64>, CoreError> {
        let sql = format!(
            "SELECT last_processed_root_pk FROM archive_job WHERE job_name = {}",
            self.dialect.placeholder(0),
        );
        let rows = self
            .adapter
            .query(&sql, &[Value::String(job_name.to_string())])
            .await
            .map_err(CoreError::Db)?;

        Ok(rows.first().and_then(|r| r.get_value("last_processed_root_pk").as_i64()))
    }

    pub async fn should_resume(&self, job_name: &str) -> Result<bool, CoreError> {
        let checkpoint = self.checkpoint(job_name).await?.unwrap_or(0);
        if checkpoint > 0 {
            return Ok(true);
        }
        Ok(!self.get_pending(job_name).await?.is_empty())
    }

    pub async fn stats(&self, job_name: &str) -> Result<JobLogStats, CoreError> {
        let sql = format!(
            "SELECT status, COUNT(*) AS cnt FROM archive_job_log WHERE job_name = {} GROUP BY status",
            self.dialect.placeholder(0),
        );
        let rows = self
            .adapter
            .query(&sql, &[Value::String(job_name.to_string())])
            .await
            .map_err(CoreError::Db)?;

        let mut stats = JobLogStats::default();
        for row in rows {
            let status = row.get_value("status").as_string().unwrap_or_default();
            let count = row.get_value("cnt").as_i64().unwrap_or(0) as u64;
            match status.as_str() {
                "pending" => stats.pending = count,
                "completed" => stats.completed = count,
                "failed" => stats.failed = count,
                _ => {}
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{error::DbError, CopyStats, CopyTableOp, DatabaseKind};
    use model::records::row::RowData;
    use model::replication::ReplicationStatus;

    struct StubAdapter;

    #[async_trait]
    impl SqlAdapter for StubAdapter {
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
        async fn copy_all(
            &self,
            _ops: Vec<CopyTableOp>,
            _disable_fk_checks: bool,
        ) -> Result<CopyStats, DbError> {
            Ok(CopyStats::default())
        }
        async fn replication_status(&self) -> Result<ReplicationStatus, DbError> {
            Ok(ReplicationStatus::default())
        }
    }

    #[tokio::test]
    async fn update_checkpoint_rejects_non_numeric_root_pk() {
        let adapter = StubAdapter;
        let store = ResumeStore::new(&adapter);

        let err = store
            .update_checkpoint("job-1", &PkValue::Str("not-a-number".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Resume(ResumeError::NonNumericPk(pk)) if pk == "not-a-number"
        ));
    }

    #[tokio::test]
    async fn log_batch_pending_rejects_non_numeric_root_pk() {
        let adapter = StubAdapter;
        let store = ResumeStore::new(&adapter);

        let err = store
            .log_batch_pending("job-1", &[PkValue::Str("uuid-1".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Resume(ResumeError::NonNumericPk(_))));
    }

    #[tokio::test]
    async fn update_checkpoint_accepts_numeric_root_pk() {
        let adapter = StubAdapter;
        let store = ResumeStore::new(&adapter);

        store
            .update_checkpoint("job-1", &PkValue::Int(42))
            .await
            .unwrap();
    }
}
