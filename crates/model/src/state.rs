use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `archive_job.status` — persisted as the integer codes from §6.1
/// (`0=idle, 1=running, 2=paused, 3=failed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum JobStatus {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Failed = 3,
}

impl JobStatus {
    pub fn as_code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(JobStatus::Idle),
            1 => Some(JobStatus::Running),
            2 => Some(JobStatus::Paused),
            3 => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One row of `archive_job`: the durable cursor and status for a named job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job_name: String,
    pub root_table: String,
    pub last_processed_root_pk: i64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `archive_job_log.status` — a per-root-PK outcome, unique on
/// `(job_name, root_pk)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Completed,
    Failed,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Pending => "pending",
            LogStatus::Completed => "completed",
            LogStatus::Failed => "failed",
        }
    }
}

/// One row of `archive_job_log`: the outcome of archiving a single root PK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub job_name: String,
    pub root_pk: i64,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts surfaced by `Resume Store.stats` — pending/completed/failed
/// root PKs for a job, regardless of which run produced them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JobLogStats {
    pub pending: u64,
    pub completed: u64,
    pub failed: u64,
}
