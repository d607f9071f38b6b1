//! Shape validation over a parsed job file, before it becomes a `JobSpec`.
//!
//! This is deliberately shallower than `graph::Graph::build`'s conflict
//! resolution: it exists to catch obviously malformed job files with a
//! friendly, all-at-once error report, not to resolve the dependency DAG.

use model::{JobSpec, RuntimeSettings};
use std::collections::HashSet;

use crate::error::ConfigError;

/// Validates `spec` and `runtime`, collecting every problem found rather
/// than failing on the first one.
pub fn validate(spec: &JobSpec, runtime: &RuntimeSettings) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_no_duplicate_tables(spec, &mut errors);
    validate_batch_sizes(runtime, &mut errors);
    validate_lag_settings(runtime, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn validate_no_duplicate_tables(spec: &JobSpec, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    seen.insert(spec.root_table.as_str());

    let mut duplicates = HashSet::new();
    for (_, relation) in spec.flatten() {
        if !seen.insert(relation.table.as_str()) {
            duplicates.insert(relation.table.as_str());
        }
    }

    for table in duplicates {
        errors.push(format!(
            "table '{table}' is declared more than once in the relation tree"
        ));
    }
}

fn validate_batch_sizes(runtime: &RuntimeSettings, errors: &mut Vec<String>) {
    if runtime.batch_size == 0 {
        errors.push("runtime.batch_size must be greater than zero".to_string());
    }
    if runtime.batch_delete_size == 0 {
        errors.push("runtime.batch_delete_size must be greater than zero".to_string());
    }
    if runtime.verify_chunk_size == 0 {
        errors.push("runtime.verify_chunk_size must be greater than zero".to_string());
    }
    if runtime.sleep_between_batches < 0.0 {
        errors.push("runtime.sleep_between_batches must not be negative".to_string());
    }
}

fn validate_lag_settings(runtime: &RuntimeSettings, errors: &mut Vec<String>) {
    if runtime.replica_enabled && runtime.lag_threshold_seconds < 0 {
        errors.push("runtime.lag_threshold_seconds must not be negative".to_string());
    }
    if runtime.replica_enabled && runtime.lag_check_interval_seconds == 0 {
        errors.push(
            "runtime.lag_check_interval_seconds must be greater than zero when replica_enabled"
                .to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{DependencyKind, Relation};

    fn relation(table: &str) -> Relation {
        Relation {
            table: table.to_string(),
            primary_key: "id".to_string(),
            foreign_key: format!("{table}_id"),
            dependency_type: DependencyKind::OneToMany,
            relations: vec![],
        }
    }

    #[test]
    fn rejects_duplicate_table_in_relation_tree() {
        let spec = JobSpec::new("customers", "id")
            .with_relation(relation("orders"))
            .with_relation(relation("orders"));
        let err = validate(&spec, &RuntimeSettings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let spec = JobSpec::new("customers", "id");
        let mut runtime = RuntimeSettings::default();
        runtime.batch_size = 0;
        let err = validate(&spec, &runtime).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("batch_size")));
            }
            _ => panic!("expected Validation error"),
        }
    }

    #[test]
    fn accepts_well_formed_spec() {
        let spec = JobSpec::new("customers", "id").with_relation(relation("orders"));
        assert!(validate(&spec, &RuntimeSettings::default()).is_ok());
    }
}
