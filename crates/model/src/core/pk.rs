use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A primary-key scalar as it moves between the Root ID Fetcher, Record
/// Discovery, and the Resume Store. The source design carries PKs as
/// untyped scalars through every layer; here that contract is made a
/// tagged sum type instead, so a mismatch between integer and string
/// PK tables is a compile-time distinction rather than a runtime surprise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PkValue {
    Int(i64),
    Str(String),
}

impl PkValue {
    /// The Resume Store persists checkpoints as 64-bit integers (§9); string
    /// PK tables cannot participate in checkpoint resume unless the caller
    /// supplies a numeric surrogate. Returns `None` for `Str`.
    pub fn as_checkpoint(&self) -> Option<i64> {
        match self {
            PkValue::Int(v) => Some(*v),
            PkValue::Str(_) => None,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(PkValue::Int(*v)),
            Value::String(v) => Some(PkValue::Str(v.clone())),
            Value::Bytes(v) => String::from_utf8(v.clone()).ok().map(PkValue::Str),
            Value::Decimal(v) => v.to_string().parse::<i64>().ok().map(PkValue::Int),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PkValue::Int(v) => Value::Int(*v),
            PkValue::Str(v) => Value::String(v.clone()),
        }
    }
}

impl fmt::Display for PkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PkValue::Int(v) => write!(f, "{v}"),
            PkValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for PkValue {
    fn from(v: i64) -> Self {
        PkValue::Int(v)
    }
}

impl From<String> for PkValue {
    fn from(v: String) -> Self {
        PkValue::Str(v)
    }
}

impl From<&str> for PkValue {
    fn from(v: &str) -> Self {
        PkValue::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_pk_round_trips_through_value() {
        let pk = PkValue::Int(42);
        assert_eq!(PkValue::from_value(&pk.to_value()), Some(pk));
    }

    #[test]
    fn string_pk_has_no_checkpoint_surrogate() {
        let pk = PkValue::Str("abc-1".to_string());
        assert_eq!(pk.as_checkpoint(), None);
    }
}
