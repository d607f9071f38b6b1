use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// A single source or destination row: the table it was read from, and its
/// columns in result-set order. Carried from the Copy Phase's `SELECT *`
/// straight through to the destination bind — column order is preserved
/// because the insert is prepared from this same order (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn entity_name(&self) -> String {
        self.entity.clone()
    }

    pub fn encode_csv_value(&self, field: &str) -> String {
        self.get(field)
            .and_then(|f| f.value.as_ref())
            .map(Value::encode_csv)
            .unwrap_or_else(|| "\\N".to_string())
    }

    pub fn size_bytes(&self) -> usize {
        let mut size = self.entity.len();
        for field_value in &self.field_values {
            size += field_value.name.len();
            size += match &field_value.value {
                Some(v) => v.size_bytes(),
                None => 0,
            };
        }
        size
    }
}
