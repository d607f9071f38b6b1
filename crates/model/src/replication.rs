use serde::{Deserialize, Serialize};

/// A transient read of replica health, parsed from `SHOW REPLICA STATUS`
/// (or the legacy `SHOW SLAVE STATUS`). Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationStatus {
    pub seconds_behind_primary: Option<i64>,
    pub io_thread_running: Option<bool>,
    pub sql_thread_running: Option<bool>,
    pub last_error: Option<String>,
}

impl ReplicationStatus {
    /// True when replication looks unconfigured: no rows came back from the
    /// status query, in which case every field here is left at its default.
    pub fn is_unconfigured(&self) -> bool {
        self.seconds_behind_primary.is_none()
            && self.io_thread_running.is_none()
            && self.sql_thread_running.is_none()
    }
}
