use bigdecimal::BigDecimal;
use model::core::{data_type::DataType, value::Value};
use model::records::row::RowData;
use model::FieldValue;
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::Row as MySqlRow;
use std::fmt;
use tokio_postgres::{types::Json as PgJson, Row as PgRow};
use tracing::warn;

/// Maps a `mysql_async` wire column type to the SQL type name
/// `DataType::from_mysql_type`'s lookup table expects — `ColumnType`'s
/// `Debug` output (`MYSQL_TYPE_LONG`, ...) is not one of those keys, so it
/// cannot be used directly. Unsigned-ness is a separate flag on the
/// column, not part of `ColumnType`, so it's threaded in here too.
fn mysql_col_type_name(column_type: ColumnType, unsigned: bool) -> &'static str {
    use ColumnType::*;

    match column_type {
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => "DECIMAL",
        MYSQL_TYPE_TINY => {
            if unsigned {
                "TINYINT UNSIGNED"
            } else {
                "TINYINT"
            }
        }
        MYSQL_TYPE_SHORT => {
            if unsigned {
                "SMALLINT UNSIGNED"
            } else {
                "SMALLINT"
            }
        }
        MYSQL_TYPE_INT24 => {
            if unsigned {
                "MEDIUMINT UNSIGNED"
            } else {
                "MEDIUMINT"
            }
        }
        MYSQL_TYPE_LONG => {
            if unsigned {
                "INT UNSIGNED"
            } else {
                "INT"
            }
        }
        MYSQL_TYPE_LONGLONG => {
            if unsigned {
                "BIGINT UNSIGNED"
            } else {
                "BIGINT"
            }
        }
        MYSQL_TYPE_FLOAT => "FLOAT",
        MYSQL_TYPE_DOUBLE => "DOUBLE",
        MYSQL_TYPE_NULL => "NULL",
        MYSQL_TYPE_TIMESTAMP | MYSQL_TYPE_TIMESTAMP2 => "TIMESTAMP",
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 => "DATETIME",
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => "DATE",
        MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => "TIME",
        MYSQL_TYPE_YEAR => "YEAR",
        MYSQL_TYPE_BIT => "BIT",
        MYSQL_TYPE_JSON => "JSON",
        MYSQL_TYPE_ENUM => "ENUM",
        MYSQL_TYPE_SET => "SET",
        MYSQL_TYPE_TINY_BLOB => "TINYBLOB",
        MYSQL_TYPE_MEDIUM_BLOB => "MEDIUMBLOB",
        MYSQL_TYPE_LONG_BLOB => "LONGBLOB",
        MYSQL_TYPE_BLOB => "BLOB",
        MYSQL_TYPE_VARCHAR | MYSQL_TYPE_VAR_STRING => "VARCHAR",
        MYSQL_TYPE_STRING => "CHAR",
        MYSQL_TYPE_GEOMETRY => "GEOMETRY",
        _ => "VARCHAR",
    }
}

/// A driver row from either backend, seen through one interface so the
/// Copy Phase's `SELECT *` scan and the Verifier's row fetch don't need to
/// know which database produced the row.
pub enum DbRow<'a> {
    MySql(&'a MySqlRow),
    Postgres(&'a PgRow),
}

impl DbRow<'_> {
    pub fn to_row_data(&self, table: &str) -> RowData {
        let columns = self
            .columns()
            .into_iter()
            .map(|column| {
                let data_type = self.column_data_type(&column);
                let value = self.get_value(&data_type, &column);
                FieldValue {
                    name: column,
                    value,
                    data_type,
                }
            })
            .collect();

        RowData::new(table, columns)
    }

    pub fn columns(&self) -> Vec<String> {
        match self {
            DbRow::MySql(row) => row
                .columns_ref()
                .iter()
                .map(|col| col.name_str().into_owned())
                .collect(),
            DbRow::Postgres(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        }
    }

    fn column_db_type_name(&self, name: &str) -> String {
        match self {
            DbRow::MySql(row) => row
                .columns_ref()
                .iter()
                .find(|c| c.name_ref() == name.as_bytes())
                .map(|c| mysql_col_type_name(c.column_type(), c.flags().contains(ColumnFlags::UNSIGNED_FLAG)).to_string())
                .unwrap_or_else(|| "VARCHAR".to_string()),
            DbRow::Postgres(row) => row
                .columns()
                .iter()
                .find(|c| c.name() == name)
                .map(|c| c.type_().name().to_string())
                .unwrap_or_else(|| "text".to_string()),
        }
    }

    fn column_data_type(&self, name: &str) -> DataType {
        DataType::try_from(self.column_db_type_name(name).as_str()).unwrap_or_else(|_| {
            warn!(column = name, "unrecognized column type, treating as text");
            DataType::String
        })
    }

    pub fn get_value(&self, data_type: &DataType, name: &str) -> Option<Value> {
        match data_type {
            DataType::Int
            | DataType::Int4
            | DataType::Long
            | DataType::LongLong
            | DataType::Short
            | DataType::ShortUnsigned
            | DataType::IntUnsigned
            | DataType::Year => self.try_get_i64(name).map(Value::Int),
            DataType::Float | DataType::Double => self.try_get_f64(name).map(Value::Float),
            DataType::Decimal | DataType::NewDecimal => {
                self.try_get_bigdecimal(name).map(Value::Decimal)
            }
            DataType::Boolean => self.try_get_bool(name).map(Value::Boolean),
            DataType::Json => self.try_get_json(name).map(Value::Json),
            DataType::Timestamp => self.try_get_timestamp(name).map(Value::Timestamp),
            DataType::Date => self.try_get_date(name).map(Value::Date),
            DataType::Enum => self
                .try_get_string(name)
                .map(|v| Value::Enum(name.to_string(), v)),
            DataType::Bytea
            | DataType::Geometry
            | DataType::Blob
            | DataType::TinyBlob
            | DataType::MediumBlob
            | DataType::LongBlob
            | DataType::Binary
            | DataType::VarBinary => self.try_get_bytes(name).map(Value::Bytes),
            _ => self.try_get_string(name).map(Value::String),
        }
    }

    pub fn try_get_i64(&self, name: &str) -> Option<i64> {
        match self {
            DbRow::MySql(row) => row
                .get_opt::<i64, _>(name)
                .and_then(Result::ok)
                .or_else(|| row.get_opt::<u64, _>(name).and_then(Result::ok).map(|v| v as i64)),
            DbRow::Postgres(row) => row
                .try_get::<_, i64>(name)
                .ok()
                .or_else(|| row.try_get::<_, i32>(name).ok().map(i64::from)),
        }
    }

    pub fn try_get_f64(&self, name: &str) -> Option<f64> {
        match self {
            DbRow::MySql(row) => row.get_opt::<f64, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row
                .try_get::<_, f64>(name)
                .ok()
                .or_else(|| row.try_get::<_, f32>(name).ok().map(f64::from)),
        }
    }

    pub fn try_get_bigdecimal(&self, name: &str) -> Option<BigDecimal> {
        match self {
            DbRow::MySql(row) => row.get_opt::<BigDecimal, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row
                .try_get::<_, rust_decimal::Decimal>(name)
                .ok()
                .and_then(|d| d.to_string().parse::<BigDecimal>().ok()),
        }
    }

    pub fn try_get_string(&self, name: &str) -> Option<String> {
        match self {
            DbRow::MySql(row) => row.get_opt::<String, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row.try_get::<_, String>(name).ok(),
        }
    }

    pub fn try_get_bool(&self, name: &str) -> Option<bool> {
        match self {
            DbRow::MySql(row) => row.get_opt::<bool, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row.try_get::<_, bool>(name).ok(),
        }
    }

    pub fn try_get_json(&self, name: &str) -> Option<serde_json::Value> {
        match self {
            DbRow::MySql(row) => row.get_opt::<serde_json::Value, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row
                .try_get::<_, PgJson<serde_json::Value>>(name)
                .ok()
                .map(|j| j.0),
        }
    }

    pub fn try_get_timestamp(&self, name: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            DbRow::MySql(row) => row
                .get_opt::<chrono::NaiveDateTime, _>(name)
                .and_then(Result::ok)
                .map(|naive| chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(naive, chrono::Utc)),
            DbRow::Postgres(row) => row.try_get::<_, chrono::DateTime<chrono::Utc>>(name).ok(),
        }
    }

    pub fn try_get_date(&self, name: &str) -> Option<chrono::NaiveDate> {
        match self {
            DbRow::MySql(row) => row.get_opt::<chrono::NaiveDate, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row.try_get::<_, chrono::NaiveDate>(name).ok(),
        }
    }

    pub fn try_get_bytes(&self, name: &str) -> Option<Vec<u8>> {
        match self {
            DbRow::MySql(row) => row.get_opt::<Vec<u8>, _>(name).and_then(Result::ok),
            DbRow::Postgres(row) => row.try_get::<_, Vec<u8>>(name).ok(),
        }
    }
}

impl fmt::Debug for DbRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbRow::MySql(row) => write!(f, "{row:?}"),
            DbRow::Postgres(row) => write!(f, "{row:?}"),
        }
    }
}
