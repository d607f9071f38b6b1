pub mod core;
pub mod record_set;
pub mod records;
pub mod replication;
pub mod spec;
pub mod state;

pub use core::{DataType, FieldValue, PkValue, Value};
pub use record_set::{DiscoveryStats, RecordSet};
pub use records::RowData;
pub use replication::ReplicationStatus;
pub use spec::{DependencyKind, JobSpec, Relation, RuntimeSettings, VerificationMethod};
pub use state::{JobLogEntry, JobLogStats, JobState, JobStatus, LogStatus};
