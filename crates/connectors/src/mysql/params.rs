use chrono::{Datelike, Timelike};
use model::core::value::Value;
use mysql_async::{params::Params, Value as MySqlValue};

/// Converts our backend-agnostic `Value` scalars into the driver's own
/// value representation for positional binding.
pub fn to_mysql_value(value: &Value) -> MySqlValue {
    match value {
        Value::Int(v) => MySqlValue::Int(*v),
        Value::Float(v) => MySqlValue::Double(*v),
        Value::Decimal(v) => MySqlValue::Bytes(v.to_string().into_bytes()),
        Value::String(v) => MySqlValue::Bytes(v.clone().into_bytes()),
        Value::Boolean(v) => MySqlValue::Int(if *v { 1 } else { 0 }),
        Value::Json(v) => MySqlValue::Bytes(v.to_string().into_bytes()),
        Value::Bytes(v) => MySqlValue::Bytes(v.clone()),
        Value::Date(v) => MySqlValue::Date(v.year() as u16, v.month() as u8, v.day() as u8, 0, 0, 0, 0),
        Value::Timestamp(v) => {
            let naive = v.naive_utc();
            MySqlValue::Date(
                naive.year() as u16,
                naive.month() as u8,
                naive.day() as u8,
                naive.hour() as u8,
                naive.minute() as u8,
                naive.second() as u8,
                v.timestamp_subsec_micros(),
            )
        }
        Value::Enum(_, v) => MySqlValue::Bytes(v.clone().into_bytes()),
        Value::Null => MySqlValue::NULL,
    }
}

pub fn to_params(values: &[Value]) -> Params {
    Params::Positional(values.iter().map(to_mysql_value).collect())
}
