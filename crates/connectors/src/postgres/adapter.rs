use crate::{
    adapter::{CopyStats, CopyTableOp, DatabaseKind, SqlAdapter},
    dialect::SqlDialect,
    error::{ConnectorError, DbError},
    postgres::params::{as_refs, to_params},
    row::DbRow,
};
use async_trait::async_trait;
use model::{core::value::Value, records::row::RowData, replication::ReplicationStatus};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::warn;

pub struct PgAdapter {
    client: RwLock<Client>,
}

impl PgAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let connector = TlsConnector::new().map_err(ConnectorError::TlsConfig)?;
        let tls = MakeTlsConnector::new(connector);
        let (client, connection) = tokio_postgres::connect(url, tls).await?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "postgres connection task terminated");
            }
        });

        Ok(PgAdapter {
            client: RwLock::new(client),
        })
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Postgres
    }

    async fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let bound = to_params(params);
        let client = self.client.read().await;
        let affected = client.execute(sql, &as_refs(&bound)).await?;
        Ok(affected)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>, DbError> {
        let bound = to_params(params);
        let client = self.client.read().await;
        let rows = client.query(sql, &as_refs(&bound)).await?;
        Ok(rows.iter().map(|row| DbRow::Postgres(row).to_row_data("")).collect())
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let client = self.client.read().await;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
                &[&table],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let client = self.client.read().await;
        let rows = client
            .query(
                "SELECT table_name FROM information_schema.tables WHERE table_schema = current_schema()",
                &[],
            )
            .await?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    async fn copy_all(
        &self,
        ops: Vec<CopyTableOp>,
        disable_fk_checks: bool,
    ) -> Result<CopyStats, DbError> {
        let mut client = self.client.write().await;
        let tx = client.transaction().await?;

        if disable_fk_checks {
            tx.batch_execute("SET CONSTRAINTS ALL DEFERRED").await?;
        }

        let mut stats = CopyStats::default();
        for op in &ops {
            let cols = op
                .columns
                .iter()
                .map(|c| SqlDialect::Postgres.quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = SqlDialect::Postgres.placeholders(0, op.columns.len());
            let sql = format!(
                "INSERT INTO {} ({cols}) VALUES ({placeholders}) ON CONFLICT DO NOTHING",
                SqlDialect::Postgres.quote(&op.table)
            );

            let mut affected = 0u64;
            for row in &op.rows {
                let bound = to_params(row);
                match tx.execute(sql.as_str(), &as_refs(&bound)).await {
                    Ok(n) => affected += n,
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
        Err(DbError::Unsupported(
            "Postgres adapter does not expose replica lag status".to_string(),
        ))
    }
}
