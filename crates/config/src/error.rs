use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read job file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read env file {path}: {source}")]
    ReadEnvFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized job file extension {0:?} (expected .yaml, .yml, or .json)")]
    UnknownExtension(String),

    #[error("invalid env file: {0}")]
    MalformedEnvFile(String),

    #[error("unresolved placeholder ${{{0}}} in job file")]
    UnresolvedPlaceholder(String),

    #[error("failed to parse job file as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse job file as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid job file: {0}")]
    Invalid(String),

    #[error("job file failed validation:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
}
