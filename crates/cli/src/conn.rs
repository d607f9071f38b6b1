use crate::error::CliError;
use async_trait::async_trait;
use connectors::{MySqlAdapter, PgAdapter, SqlAdapter};
use std::str::FromStr;
use tracing::{error, info};

/// Which of the two supported backends a connection string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    MySql,
    Postgres,
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(ConnectionKind::MySql),
            "pg" | "postgres" | "postgresql" => Ok(ConnectionKind::Postgres),
            other => Err(format!("unknown connection kind: {other}")),
        }
    }
}

impl ConnectionKind {
    /// Infers the backend from a connection string's scheme, falling back
    /// to an explicit `--format` flag when the scheme is ambiguous.
    pub fn from_url(url: &str) -> Result<Self, String> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(ConnectionKind::MySql)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(ConnectionKind::Postgres)
        } else {
            Err(format!("cannot infer database kind from URL: {url}"))
        }
    }
}

/// Connects to `url`, dispatching on the inferred backend.
pub async fn connect(url: &str) -> Result<std::sync::Arc<dyn SqlAdapter>, CliError> {
    match ConnectionKind::from_url(url).map_err(CliError::InvalidConnectionFormat)? {
        ConnectionKind::MySql => {
            let adapter = MySqlAdapter::connect(url).await?;
            Ok(std::sync::Arc::new(adapter))
        }
        ConnectionKind::Postgres => {
            let adapter = PgAdapter::connect(url).await?;
            Ok(std::sync::Arc::new(adapter))
        }
    }
}

/// Trait for "pinging" a data source before committing to a full run.
#[async_trait]
pub trait ConnectionPinger {
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct AdapterPinger {
    pub label: &'static str,
    pub adapter: std::sync::Arc<dyn SqlAdapter>,
}

#[async_trait]
impl ConnectionPinger for AdapterPinger {
    async fn ping(&self) -> Result<(), CliError> {
        info!(label = self.label, "pinging database");

        let rows = self
            .adapter
            .query("SELECT 1 AS ok", &[])
            .await
            .map_err(|e| {
                error!(label = self.label, error = %e, "ping query failed");
                CliError::Unexpected(format!("{} ping failed: {e}", self.label))
            })?;

        let ok = rows
            .first()
            .map(|row| row.get_value("ok").as_i64().unwrap_or(0) == 1)
            .unwrap_or(false);

        if !ok {
            let msg = format!("{} ping returned an unexpected result", self.label);
            error!("{msg}");
            return Err(CliError::Unexpected(msg));
        }

        info!(label = self.label, "ping succeeded");
        Ok(())
    }
}
