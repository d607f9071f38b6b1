use serde::{Deserialize, Serialize};

/// Row verification strategy applied after copy and before delete (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    Count,
    Sha256,
    Skip,
}

impl Default for VerificationMethod {
    fn default() -> Self {
        VerificationMethod::Count
    }
}

/// Immutable run-time tuning knobs for one archive job. Parsed once from
/// external configuration alongside the `JobSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub batch_size: u32,
    pub batch_delete_size: u32,
    pub sleep_between_batches: f64,
    pub verification_method: VerificationMethod,
    pub disable_foreign_key_checks: bool,
    pub replica_enabled: bool,
    pub lag_threshold_seconds: i64,
    pub lag_check_interval_seconds: u64,
    pub force_triggers: bool,
    /// Chunk size for §4.6 hash verification; distinct from `batch_size`.
    pub verify_chunk_size: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        RuntimeSettings {
            batch_size: 500,
            batch_delete_size: 500,
            sleep_between_batches: 0.0,
            verification_method: VerificationMethod::default(),
            disable_foreign_key_checks: false,
            replica_enabled: false,
            lag_threshold_seconds: 10,
            lag_check_interval_seconds: 5,
            force_triggers: false,
            verify_chunk_size: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_batch_sizes() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.batch_size, 500);
        assert_eq!(settings.verification_method, VerificationMethod::Count);
    }
}
