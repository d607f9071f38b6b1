use crate::core::data_type::DataType;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash, str::FromStr};

/// A dynamically-typed scalar carried between a driver row and a bound statement
/// parameter. Every value that crosses the source/destination boundary is one
/// of these; the concrete SQL type is recovered from `DataType` at bind time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Enum(String, String),
    Null,
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Decimal(v) => v.to_string().hash(state),
            Float(v) => v.to_bits().hash(state),
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            Json(v) => serde_json::to_string(v).unwrap_or_default().hash(state),
            Bytes(v) => v.hash(state),
            Date(v) => v.hash(state),
            Timestamp(v) => v.hash(state),
            Enum(name, value) => {
                name.hash(state);
                value.hash(state);
            }
            Null => {}
        }
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Decimal(v) => v.to_i64(),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.parse::<i64>().ok(),
            Value::Boolean(v) => Some(if *v { 1 } else { 0 }),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Decimal(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => v.as_str().map(|s| s.to_string()).or(Some(v.to_string())),
            Value::Bytes(_) => None,
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::Null => None,
            Value::Enum(_, v) => Some(v.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::Decimal(v) => Some(!v.is_zero()),
            Value::Boolean(v) => Some(*v),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn as_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Decimal(v) => Some(v.clone()),
            Value::Int(v) => Some(BigDecimal::from(*v)),
            Value::Float(v) => BigDecimal::from_f64(*v),
            Value::String(s) => BigDecimal::from_str(s).ok(),
            _ => None,
        }
    }

    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_big_decimal(), other.as_big_decimal()) {
            return Some(a.cmp(&b));
        }

        use Value::*;
        match (self, other) {
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Long,
            Value::Float(_) => DataType::Float,
            Value::Decimal(_) => DataType::Decimal,
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Json(_) => DataType::Json,
            Value::Bytes(_) => DataType::Bytea,
            Value::Date(_) => DataType::Date,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Enum(_, _) => DataType::Enum,
            Value::Null => DataType::Null,
        }
    }

    /// Rough heap footprint, used to size discovery/copy batches in logs.
    pub fn size_bytes(&self) -> usize {
        match self {
            Value::Int(_) | Value::Float(_) => 8,
            Value::Decimal(v) => v.to_string().len(),
            Value::String(v) => v.len(),
            Value::Boolean(_) => 1,
            Value::Json(v) => v.to_string().len(),
            Value::Bytes(v) => v.len(),
            Value::Date(_) => 4,
            Value::Timestamp(_) => 8,
            Value::Enum(name, v) => name.len() + v.len(),
            Value::Null => 0,
        }
    }

    /// MySQL `LOAD DATA`-style CSV encoding, `\N` for null.
    pub fn encode_csv(&self) -> String {
        match self {
            Value::Null => "\\N".to_string(),
            Value::Bytes(v) => v.iter().fold(String::new(), |mut acc, b| {
                acc.push_str(&format!("{b:02x}"));
                acc
            }),
            other => other.hash_encode(),
        }
    }

    /// Canonical textual encoding used by the row hash verifier (§4.6): decimal
    /// for numbers, lowercase booleans, verbatim text, `NULL` sentinel for nulls.
    /// Deliberately distinct from `Display`, which renders SQL literals.
    pub fn hash_encode(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format!("{v:.12}"),
            Value::Decimal(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Boolean(v) => if *v { "true" } else { "false" }.to_string(),
            Value::Json(v) => v.to_string(),
            Value::Bytes(v) => v.iter().fold(String::new(), |mut acc, b| {
                acc.push_str(&format!("{b:02x}"));
                acc
            }),
            Value::Date(v) => v.to_string(),
            Value::Timestamp(v) => v.to_rfc3339(),
            Value::Enum(_, v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub value: Option<Value>,
    pub data_type: DataType,
}

impl FieldValue {
    pub fn value_data_type(&self) -> Option<DataType> {
        self.value.as_ref().map(|v| v.data_type())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:.15}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => {
                let json_str = v.to_string().replace('\'', "''");
                write!(f, "'{json_str}'")
            }
            Value::Bytes(v) => {
                let hex = v.iter().fold(String::new(), |acc, byte: &u8| acc + &format!("{byte:02x}"));
                write!(f, "x'{hex}'")
            }
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::Null => write!(f, "NULL"),
            Value::Enum(_, v) => write!(f, "'{v}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_encode_is_stable_for_integers_and_strings() {
        assert_eq!(Value::Int(42).hash_encode(), "42");
        assert_eq!(Value::String("abc".into()).hash_encode(), "abc");
        assert_eq!(Value::Null.hash_encode(), "NULL");
        assert_eq!(Value::Boolean(true).hash_encode(), "true");
    }

    #[test]
    fn compare_orders_decimals_across_variants() {
        let a = Value::Int(5);
        let b = Value::Decimal(BigDecimal::from(10));
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }
}
