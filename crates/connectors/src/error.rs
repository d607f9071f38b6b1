use std::string::FromUtf8Error;
use thiserror::Error;

/// Errors raised while establishing a connection or building a pool.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("MySQL connector creation failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("invalid database URL: {0}")]
    InvalidUrl(String),

    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] native_tls::Error),

    #[error("connection error: {0}")]
    Connection(#[from] tokio_postgres::Error),
}

/// All errors coming from a statement execution against a connected handle.
/// Every `SqlAdapter` method returns this; the orchestrator wraps it with
/// table/batch context before it reaches the operator (§7).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unsupported operation for this backend: {0}")]
    Unsupported(String),

    #[error("unexpected result shape: {0}")]
    Unknown(String),
}
