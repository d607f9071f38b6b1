pub mod builder;
pub mod error;

pub use builder::{EdgeMeta, Graph, Node};
pub use error::GraphError;
