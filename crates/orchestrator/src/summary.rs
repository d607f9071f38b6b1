use std::{collections::HashMap, time::Duration};

/// Result of one `Orchestrator::execute` call — the post-run digest named
/// in §4.11 step 6 (duration, tables touched, rows moved, collected
/// errors, success flag).
#[derive(Debug, Clone, Default)]
pub struct ArchiveSummary {
    pub job_name: String,
    pub duration: Duration,
    pub root_pks_processed: u64,
    pub rows_copied_by_table: HashMap<String, u64>,
    pub rows_deleted_by_table: HashMap<String, u64>,
    pub errors: Vec<String>,
    pub success: bool,
}

impl ArchiveSummary {
    pub fn rows_copied(&self) -> u64 {
        self.rows_copied_by_table.values().sum()
    }

    pub fn rows_deleted(&self) -> u64 {
        self.rows_deleted_by_table.values().sum()
    }

    fn merge_counts(target: &mut HashMap<String, u64>, source: &HashMap<String, u64>) {
        for (table, count) in source {
            *target.entry(table.clone()).or_insert(0) += count;
        }
    }

    pub(crate) fn record_copy(&mut self, rows_by_table: &HashMap<String, u64>) {
        Self::merge_counts(&mut self.rows_copied_by_table, rows_by_table);
    }

    pub(crate) fn record_delete(&mut self, rows_by_table: &HashMap<String, u64>) {
        Self::merge_counts(&mut self.rows_deleted_by_table, rows_by_table);
    }
}
