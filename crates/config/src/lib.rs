pub mod env;
pub mod error;
pub mod loader;
pub mod validator;

pub use env::EnvOverlay;
pub use error::ConfigError;
pub use loader::{load, load_from_strs, ConnectionStrings, LoadedJob};
