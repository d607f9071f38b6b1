use std::path::{Path, PathBuf};

use model::{JobSpec, RuntimeSettings};
use serde::Deserialize;

use crate::env::EnvOverlay;
use crate::error::ConfigError;
use crate::validator;

/// The three connection strings a job file names, after placeholder
/// resolution. `replica` is only required when `runtime.replica_enabled`.
#[derive(Debug, Clone)]
pub struct ConnectionStrings {
    pub source: String,
    pub destination: String,
    pub replica: Option<String>,
}

/// A fully parsed and validated job file, ready to hand to the orchestrator.
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub job_name: String,
    pub connections: ConnectionStrings,
    pub spec: JobSpec,
    pub runtime: RuntimeSettings,
}

/// Shape of the on-disk job file (§6.3): the connection strings and job name
/// live alongside a flattened `JobSpec` plus a nested `runtime` block.
#[derive(Debug, Deserialize)]
struct JobFile {
    job_name: String,
    source: String,
    destination: String,
    #[serde(default)]
    replica: Option<String>,
    #[serde(flatten)]
    spec: JobSpec,
    #[serde(default)]
    runtime: RuntimeSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Json,
}

fn detect_format(path: &Path) -> Result<FileFormat, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
        Some("json") => Ok(FileFormat::Json),
        other => Err(ConfigError::UnknownExtension(
            other.unwrap_or_default().to_string(),
        )),
    }
}

/// Loads a job file from `path`, optionally overlaying `env_file` on top of
/// the process environment for `${VAR}` resolution, and runs the shape
/// validation pass before returning the loaded job.
pub fn load(path: impl AsRef<Path>, env_file: Option<&Path>) -> Result<LoadedJob, ConfigError> {
    let path = path.as_ref();
    let format = detect_format(path)?;

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut overlay = EnvOverlay::from_process();
    if let Some(env_file) = env_file {
        overlay.load_file(env_file)?;
    }
    let resolved = overlay.resolve(&raw)?;

    let file: JobFile = match format {
        FileFormat::Yaml => serde_yaml::from_str(&resolved)?,
        FileFormat::Json => serde_json::from_str(&resolved)?,
    };

    validator::validate(&file.spec, &file.runtime)?;

    if file.runtime.replica_enabled && file.replica.is_none() {
        return Err(ConfigError::Invalid(
            "runtime.replica_enabled is true but no 'replica' connection string was given"
                .to_string(),
        ));
    }

    Ok(LoadedJob {
        job_name: file.job_name,
        connections: ConnectionStrings {
            source: file.source,
            destination: file.destination,
            replica: file.replica,
        },
        spec: file.spec,
        runtime: file.runtime,
    })
}

/// Convenience wrapper around [`load`] for callers that only have a path
/// string and an optional env file path string (the CLI's case).
pub fn load_from_strs(
    path: &str,
    env_file: Option<&str>,
) -> Result<LoadedJob, ConfigError> {
    let env_file: Option<PathBuf> = env_file.map(PathBuf::from);
    load(path, env_file.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "config-loader-test-{}-{}",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    const YAML_JOB: &str = r#"
job_name: archive-stale-customers
source: ${ARCHIVE_SOURCE_URL}
destination: ${ARCHIVE_DEST_URL}
root_table: customers
primary_key: id
where: "created_at < '2024-01-01'"
relations:
  - table: orders
    primary_key: id
    foreign_key: customer_id
    dependency_type: "1-N"
    relations: []
runtime:
  batch_size: 250
  verification_method: sha256
"#;

    #[test]
    fn loads_yaml_job_file_with_env_placeholders() {
        let path = write_temp("job.yaml", YAML_JOB);
        unsafe {
            std::env::set_var("ARCHIVE_SOURCE_URL", "mysql://localhost/src");
            std::env::set_var("ARCHIVE_DEST_URL", "mysql://localhost/dst");
        }

        let job = load(&path, None).unwrap();
        assert_eq!(job.job_name, "archive-stale-customers");
        assert_eq!(job.connections.source, "mysql://localhost/src");
        assert_eq!(job.spec.root_table, "customers");
        assert_eq!(job.runtime.batch_size, 250);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load("job.toml", None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownExtension(_)));
    }

    #[test]
    fn rejects_replica_enabled_without_replica_url() {
        let contents = r#"
job_name: j
source: mysql://a/src
destination: mysql://a/dst
root_table: customers
primary_key: id
runtime:
  replica_enabled: true
"#;
        let path = write_temp("replica.yaml", contents);
        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        std::fs::remove_file(&path).ok();
    }
}
