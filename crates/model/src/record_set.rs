use crate::core::pk::PkValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Bookkeeping about one Discovery pass, independent of the discovered PKs
/// themselves — cheap to log, copy, and carry into an `ArchiveSummary`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub tables_scanned: usize,
    pub total_records: usize,
    pub bfs_depth: usize,
    pub duration: Duration,
}

/// The output of Record Discovery for one or more root PKs: every table
/// reachable from those roots, mapped to the PK values discovered for it.
/// Consumed by Copy, Verify, and Delete in that order, then discarded —
/// nothing about this value outlives one batch iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub root_pks: Vec<PkValue>,
    pub tables: HashMap<String, Vec<PkValue>>,
    pub stats: DiscoveryStats,
}

impl RecordSet {
    pub fn new(root_pks: Vec<PkValue>) -> Self {
        RecordSet {
            root_pks,
            tables: HashMap::new(),
            stats: DiscoveryStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root_pks.is_empty() && self.tables.values().all(|v| v.is_empty())
    }

    pub fn insert(&mut self, table: &str, pks: Vec<PkValue>) {
        if pks.is_empty() {
            return;
        }
        self.tables.entry(table.to_string()).or_default().extend(pks);
    }

    pub fn pks_for(&self, table: &str) -> &[PkValue] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.get(table).is_some_and(|v| !v.is_empty())
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_set_has_zero_rows() {
        let rs = RecordSet::new(vec![]);
        assert!(rs.is_empty());
        assert_eq!(rs.total_rows(), 0);
    }

    #[test]
    fn insert_skips_empty_pk_lists() {
        let mut rs = RecordSet::new(vec![PkValue::Int(1)]);
        rs.insert("orders", vec![]);
        assert!(!rs.contains_table("orders"));
        rs.insert("orders", vec![PkValue::Int(101), PkValue::Int(102)]);
        assert_eq!(rs.total_rows(), 2);
    }
}
