pub mod adapter;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod mysql;
pub mod postgres;
pub mod row;

pub use adapter::{CopyStats, CopyTableOp, DatabaseKind, SqlAdapter};
pub use dialect::SqlDialect;
pub use error::{ConnectorError, DbError};
pub use mysql::MySqlAdapter;
pub use postgres::PgAdapter;
pub use row::DbRow;
