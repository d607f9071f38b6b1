//! Record Discovery (§4.4): breadth-first traversal of the dependency
//! graph starting at a root-PK set, resolving child PKs in chunks via
//! `IN` lookups. Produces a `RecordSet`; consumed by Copy, Verify, Delete.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use crate::error::CoreError;
use connectors::{dialect::SqlDialect, SqlAdapter};
use graph::Graph;
use model::{core::value::Value, DiscoveryStats, PkValue, RecordSet};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Outcome of one `discover` call: the record set accumulated so far, and
/// whether the BFS stopped early due to cancellation (§4.4, §5).
pub struct DiscoveryOutcome {
    pub record_set: RecordSet,
    pub cancelled: bool,
}

pub struct RecordDiscovery<'g> {
    graph: &'g Graph,
    dialect: SqlDialect,
    chunk_size: usize,
}

impl<'g> RecordDiscovery<'g> {
    pub fn new(graph: &'g Graph, dialect: SqlDialect, chunk_size: usize) -> Self {
        RecordDiscovery {
            graph,
            dialect,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Truncates an oversized root-PK batch to `batch_size`, logging a
    /// warning (§8.2 boundary behavior) rather than failing the call.
    pub fn discover_batch(&self, mut root_pks: Vec<PkValue>, batch_size: usize) -> Vec<PkValue> {
        if root_pks.len() > batch_size {
            warn!(
                requested = root_pks.len(),
                batch_size, "root PK batch exceeds configured batch size, truncating"
            );
            root_pks.truncate(batch_size);
        }
        root_pks
    }

    pub async fn discover(
        &self,
        adapter: &dyn SqlAdapter,
        root_pks: Vec<PkValue>,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome, CoreError> {
        let start = Instant::now();
        let root_table = self.graph.root().to_string();

        let mut record_set = RecordSet::new(root_pks.clone());
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, Vec<PkValue>, usize)> = VecDeque::new();

        let mut max_depth = 0usize;
        let mut cancelled = false;

        if !root_pks.is_empty() {
            record_set.insert(&root_table, root_pks.clone());
            visited.insert(root_table.clone());
            queue.push_back((root_table, root_pks, 0));
        }

        while let Some((table, parent_pks, depth)) = queue.pop_front() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            max_depth = max_depth.max(depth);

            for child in self.graph.children(&table).to_vec() {
                if visited.contains(&child) {
                    continue;
                }

                let Some(edge) = self.graph.edge_meta(&table, &child) else {
                    continue;
                };
                let Some(child_pk_col) = self.graph.pk_of(&child).map(str::to_string) else {
                    continue;
                };

                let mut child_pks: Vec<PkValue> = Vec::new();
                for chunk in parent_pks.chunks(self.chunk_size) {
                    if cancel.is_cancelled() {
                        cancelled = true;
                        break;
                    }

                    let quoted_child_pk = self.dialect.quote_safe(&child_pk_col).map_err(CoreError::Db)?;
                    let quoted_child_table = self.dialect.quote_safe(&child).map_err(CoreError::Db)?;
                    let quoted_fk = self.dialect.quote_safe(&edge.fk_column).map_err(CoreError::Db)?;
                    let placeholders = self.dialect.placeholders(0, chunk.len());

                    let sql = format!(
                        "SELECT DISTINCT {quoted_child_pk} FROM {quoted_child_table} WHERE {quoted_fk} IN ({placeholders})"
                    );
                    let params: Vec<Value> = chunk.iter().map(PkValue::to_value).collect();

                    let rows = adapter
                        .query(&sql, &params)
                        .await
                        .map_err(|e| CoreError::Db(e).db_context(&child, "discovery child lookup"))?;

                    for row in rows {
                        if let Some(pk) = PkValue::from_value(&row.get_value(&child_pk_col)) {
                            child_pks.push(pk);
                        }
                    }
                }

                if cancelled {
                    break;
                }

                if child_pks.is_empty() {
                    continue;
                }

                visited.insert(child.clone());
                record_set.insert(&child, child_pks.clone());
                queue.push_back((child, child_pks, depth + 1));
            }

            if cancelled {
                break;
            }
        }

        // `depth` is 0 at the root level, so the number of levels visited
        // (§8.3 `stats.BFSLevels`) is one more than the deepest depth reached.
        let bfs_depth = if visited.is_empty() { 0 } else { max_depth + 1 };

        record_set.stats = DiscoveryStats {
            tables_scanned: visited.len(),
            total_records: record_set.total_rows(),
            bfs_depth,
            duration: start.elapsed(),
        };

        Ok(DiscoveryOutcome { record_set, cancelled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::error::DbError;
    use connectors::{CopyStats, CopyTableOp, DatabaseKind};
    use model::replication::ReplicationStatus;
    use model::{DataType, DependencyKind, FieldValue, JobSpec, Relation, RowData};

    fn two_level_spec() -> JobSpec {
        JobSpec::new("customers", "id").with_relation(Relation {
            table: "orders".to_string(),
            primary_key: "id".to_string(),
            foreign_key: "customer_id".to_string(),
            dependency_type: DependencyKind::OneToMany,
            relations: vec![],
        })
    }

    /// Returns exactly one child row per child table the query names, so a
    /// BFS over a chain spec visits every level with a single row each.
    struct ChainAdapter;

    #[async_trait]
    impl SqlAdapter for ChainAdapter {
        fn kind(&self) -> DatabaseKind {
            DatabaseKind::MySql
        }
        fn dialect(&self) -> SqlDialect {
            SqlDialect::MySql
        }
        async fn exec(&self, _sql: &str, _params: &[Value]) -> Result<u64, DbError> {
            Ok(0)
        }
        async fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<RowData>, DbError> {
            for table in ["b", "c", "d"] {
                if sql.contains(&format!("FROM `{table}`")) {
                    return Ok(vec![RowData::new(
                        table,
                        vec![FieldValue {
                            name: "id".to_string(),
                            value: Some(Value::Int(1)),
                            data_type: DataType::Long,
                        }],
                    )]);
                }
            }
            Ok(vec![])
        }
        async fn table_exists(&self, _table: &str) -> Result<bool, DbError> {
            Ok(true)
        }
        async fn list_tables(&self) -> Result<Vec<String>, DbError> {
            Ok(vec![])
        }
        async fn copy_all(&self, _ops: Vec<CopyTableOp>, _disable_fk_checks: bool) -> Result<CopyStats, DbError> {
            Ok(CopyStats::default())
        }
        async fn replication_status(&self) -> Result<ReplicationStatus, DbError> {
            Ok(ReplicationStatus::default())
        }
    }

    fn deep_chain_spec() -> JobSpec {
        JobSpec::new("a", "id").with_relation(Relation {
            table: "b".to_string(),
            primary_key: "id".to_string(),
            foreign_key: "a_id".to_string(),
            dependency_type: DependencyKind::OneToMany,
            relations: vec![Relation {
                table: "c".to_string(),
                primary_key: "id".to_string(),
                foreign_key: "b_id".to_string(),
                dependency_type: DependencyKind::OneToMany,
                relations: vec![Relation {
                    table: "d".to_string(),
                    primary_key: "id".to_string(),
                    foreign_key: "c_id".to_string(),
                    dependency_type: DependencyKind::OneToMany,
                    relations: vec![],
                }],
            }],
        })
    }

    #[tokio::test]
    async fn discover_counts_bfs_levels_not_zero_indexed_depth() {
        let spec = deep_chain_spec();
        let graph = Graph::build(&spec).unwrap();
        let discovery = RecordDiscovery::new(&graph, SqlDialect::MySql, 500);
        let adapter = ChainAdapter;
        let cancel = CancellationToken::new();

        let outcome = discovery
            .discover(&adapter, vec![PkValue::Int(1)], &cancel)
            .await
            .unwrap();

        assert_eq!(outcome.record_set.stats.bfs_depth, 4);
        assert_eq!(outcome.record_set.stats.tables_scanned, 4);
    }

    #[test]
    fn discover_batch_truncates_oversized_root_pk_lists() {
        let spec = two_level_spec();
        let graph = Graph::build(&spec).unwrap();
        let discovery = RecordDiscovery::new(&graph, SqlDialect::MySql, 500);

        let pks: Vec<PkValue> = (0..10).map(PkValue::Int).collect();
        let truncated = discovery.discover_batch(pks, 5);
        assert_eq!(truncated.len(), 5);
    }

    #[test]
    fn discover_batch_is_noop_when_within_limit() {
        let spec = two_level_spec();
        let graph = Graph::build(&spec).unwrap();
        let discovery = RecordDiscovery::new(&graph, SqlDialect::MySql, 500);

        let pks: Vec<PkValue> = (0..3).map(PkValue::Int).collect();
        let same = discovery.discover_batch(pks.clone(), 5);
        assert_eq!(same, pks);
    }
}
