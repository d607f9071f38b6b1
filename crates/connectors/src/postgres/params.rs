use bigdecimal::ToPrimitive;
use model::core::value::Value;
use rust_decimal::{prelude::FromPrimitive, Decimal as RustDecimal};
use std::str::FromStr;
use tokio_postgres::types::{Json as PgJson, ToSql};

/// Owns a boxed `ToSql` per bound value so the borrow-checker sees one
/// homogeneous slice of trait objects at the call site, mirroring how the
/// driver itself expects `&[&(dyn ToSql + Sync)]`.
pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(v) => PgParam(Box::new(*v)),
            Value::Float(v) => PgParam(Box::new(*v)),
            Value::Decimal(v) => {
                let decimal = RustDecimal::from_str(&v.to_string())
                    .unwrap_or_else(|_| RustDecimal::from_f64(v.to_f64().unwrap_or(0.0)).unwrap_or_default());
                PgParam(Box::new(decimal))
            }
            Value::String(v) => PgParam(Box::new(v.clone())),
            Value::Boolean(v) => PgParam(Box::new(*v)),
            Value::Json(v) => PgParam(Box::new(PgJson(v.clone()))),
            Value::Bytes(v) => PgParam(Box::new(v.clone())),
            Value::Date(v) => PgParam(Box::new(*v)),
            Value::Timestamp(v) => PgParam(Box::new(*v)),
            Value::Enum(_, v) => PgParam(Box::new(v.clone())),
            Value::Null => PgParam(Box::new(Option::<String>::None)),
        }
    }
}

pub fn to_params(values: &[Value]) -> Vec<PgParam> {
    values.iter().map(PgParam::from_value).collect()
}

pub fn as_refs(params: &[PgParam]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| &*p.0 as &(dyn ToSql + Sync)).collect()
}
