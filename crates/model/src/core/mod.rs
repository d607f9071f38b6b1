pub mod data_type;
pub mod pk;
pub mod value;

pub use data_type::DataType;
pub use pk::PkValue;
pub use value::{FieldValue, Value};
