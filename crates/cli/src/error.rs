use ::config::ConfigError;
use archive_core::CoreError;
use connectors::ConnectorError;
use orchestrator::ArchiveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Failed to load job configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to connect: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Preflight check failed: {0}")]
    Preflight(#[from] CoreError),

    #[error("Archive run failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Failed to serialize output to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Invalid connection format provided: {0}")]
    InvalidConnectionFormat(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
