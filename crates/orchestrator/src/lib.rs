//! Orchestrator (§4.11): top-level control flow wiring the Resume Store,
//! Lag Monitor, Root ID Fetcher, Record Discovery, Copy Phase, Verifier
//! and Delete Phase into one archive run.

pub mod error;
pub mod summary;

pub use error::ArchiveError;
pub use summary::ArchiveSummary;

use std::sync::Arc;
use std::time::{Duration, Instant};

use archive_core::{CopyPhase, DeletePhase, LagMonitor, RecordDiscovery, ResumeStore, RootIdFetcher, Verifier};
use connectors::SqlAdapter;
use graph::Graph;
use model::{JobSpec, JobStatus, LogStatus, PkValue, RuntimeSettings};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Invoked after each root PK is archived (or fails). Errors are logged
/// but never fail the run (§4.11 step 5e).
pub type CheckpointCallback<'a> = dyn Fn(&PkValue, LogStatus) -> Result<(), String> + Send + Sync + 'a;

pub struct Orchestrator {
    job_name: String,
    spec: JobSpec,
    settings: RuntimeSettings,
    graph: Graph,
    copy_order: Vec<String>,
    delete_order: Vec<String>,
    source: Arc<dyn SqlAdapter>,
    destination: Arc<dyn SqlAdapter>,
    replica: Option<Arc<dyn SqlAdapter>>,
}

impl Orchestrator {
    /// Builds the graph, validates acyclicity (via `Graph::build`), and
    /// precomputes copy/delete order. Idempotent — safe to call more than
    /// once with the same inputs.
    pub fn initialize(
        job_name: impl Into<String>,
        spec: JobSpec,
        settings: RuntimeSettings,
        source: Arc<dyn SqlAdapter>,
        destination: Arc<dyn SqlAdapter>,
        replica: Option<Arc<dyn SqlAdapter>>,
    ) -> Result<Self, ArchiveError> {
        let graph = Graph::build(&spec).map_err(archive_core::CoreError::from)?;

        if settings.replica_enabled && replica.is_none() {
            return Err(ArchiveError::Spec(
                "replica monitoring is enabled but no replica handle was supplied".to_string(),
            ));
        }

        // Non-numeric root PKs surface as `ResumeError::NonNumericPk` the first
        // time a checkpoint is persisted (§9 resolution 3) — the Resume Store
        // always runs, so there is no separate "resume tracking enabled" flag
        // to gate a static check here.
        let copy_order = graph.copy_order();
        let delete_order = graph.delete_order();

        Ok(Orchestrator {
            job_name: job_name.into(),
            spec,
            settings,
            graph,
            copy_order,
            delete_order,
            source,
            destination,
            replica,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn copy_order(&self) -> &[String] {
        &self.copy_order
    }

    pub fn delete_order(&self) -> &[String] {
        &self.delete_order
    }

    /// Runs the main batch loop (§4.11 step 4-6) until cancelled or the
    /// Root ID Fetcher is exhausted. Mid-run failures are captured into
    /// the returned summary (`success = false`, non-empty `errors`)
    /// rather than propagated, matching the "ArchiveResult" contract in
    /// §7 — `Err` is reserved for startup-time `SpecError`s.
    pub async fn execute(
        &self,
        cancel: CancellationToken,
        checkpoint_cb: Option<&CheckpointCallback<'_>>,
    ) -> Result<ArchiveSummary, ArchiveError> {
        let start = Instant::now();
        let dialect = self.source.dialect();

        let resume = ResumeStore::new(self.destination.as_ref());
        resume.init_tables().await.map_err(ArchiveError::from)?;
        let job_state = resume
            .get_or_create_job(&self.job_name, &self.spec.root_table)
            .await
            .map_err(ArchiveError::from)?;

        if resume.should_resume(&self.job_name).await.map_err(ArchiveError::from)? {
            info!(job = %self.job_name, checkpoint = job_state.last_processed_root_pk, "resuming archive job from checkpoint");
        }

        resume
            .update_status(&self.job_name, JobStatus::Running)
            .await
            .map_err(ArchiveError::from)?;

        let lag_monitor = LagMonitor::new(
            self.replica.as_deref(),
            self.settings.lag_threshold_seconds,
            self.settings.lag_check_interval_seconds,
        );

        let mut fetcher = RootIdFetcher::new(
            self.spec.root_table.clone(),
            self.spec.primary_key.clone(),
            self.spec.where_clause.clone(),
            self.settings.batch_size,
            dialect,
            Some(PkValue::Int(job_state.last_processed_root_pk)),
        );
        let discovery = RecordDiscovery::new(&self.graph, dialect, self.settings.batch_size as usize);
        let copy_phase = CopyPhase::new(dialect, self.settings.batch_size as usize);
        let verifier = Verifier::new(self.settings.verification_method, dialect, self.settings.verify_chunk_size as usize);
        let delete_phase = DeletePhase::new(dialect, self.settings.batch_delete_size as usize);

        let mut summary = ArchiveSummary {
            job_name: self.job_name.clone(),
            ..Default::default()
        };

        let outcome = self
            .run_loop(
                &cancel,
                &resume,
                &lag_monitor,
                &mut fetcher,
                &discovery,
                &copy_phase,
                &verifier,
                &delete_phase,
                checkpoint_cb,
                &mut summary,
            )
            .await;

        summary.duration = start.elapsed();

        match outcome {
            Ok(()) => {
                resume
                    .update_status(&self.job_name, JobStatus::Idle)
                    .await
                    .map_err(ArchiveError::from)?;
                summary.success = true;
                info!(job = %self.job_name, root_pks = summary.root_pks_processed, "archive run completed");
            }
            Err(ArchiveError::Core(archive_core::CoreError::Cancelled(where_))) => {
                resume
                    .update_status(&self.job_name, JobStatus::Paused)
                    .await
                    .map_err(ArchiveError::from)?;
                summary.success = false;
                summary.errors.push(format!("cancelled at {where_}"));
                info!(job = %self.job_name, "archive run paused by cancellation");
            }
            Err(e) => {
                resume
                    .update_status(&self.job_name, JobStatus::Failed)
                    .await
                    .map_err(ArchiveError::from)?;
                summary.success = false;
                summary.errors.push(e.to_string());
                error!(job = %self.job_name, error = %e, "archive run failed");
            }
        }

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_loop(
        &self,
        cancel: &CancellationToken,
        resume: &ResumeStore<'_>,
        lag_monitor: &LagMonitor<'_>,
        fetcher: &mut RootIdFetcher,
        discovery: &RecordDiscovery<'_>,
        copy_phase: &CopyPhase,
        verifier: &Verifier,
        delete_phase: &DeletePhase,
        checkpoint_cb: Option<&CheckpointCallback<'_>>,
        summary: &mut ArchiveSummary,
    ) -> Result<(), ArchiveError> {
        loop {
            if cancel.is_cancelled() {
                return Err(archive_core::CoreError::Cancelled("orchestrator.loop".to_string()).into());
            }

            lag_monitor.wait_for_lag(cancel).await.map_err(ArchiveError::from)?;

            let batch = fetcher
                .fetch_next_batch(self.source.as_ref(), cancel)
                .await
                .map_err(ArchiveError::from)?;

            if batch.is_empty() {
                return Ok(());
            }

            resume
                .log_batch_pending(&self.job_name, &batch)
                .await
                .map_err(ArchiveError::from)?;

            for pk in &batch {
                if cancel.is_cancelled() {
                    return Err(archive_core::CoreError::Cancelled("orchestrator.batch".to_string()).into());
                }

                match self
                    .process_root_pk(cancel, discovery, copy_phase, verifier, delete_phase, pk, summary)
                    .await
                {
                    Ok(()) => {
                        resume
                            .update_checkpoint(&self.job_name, pk)
                            .await
                            .map_err(ArchiveError::from)?;
                        resume
                            .mark_completed(&self.job_name, pk)
                            .await
                            .map_err(ArchiveError::from)?;
                        summary.root_pks_processed += 1;

                        if let Some(cb) = checkpoint_cb {
                            if let Err(e) = cb(pk, LogStatus::Completed) {
                                warn!(pk = %pk, error = %e, "checkpoint callback failed");
                            }
                        }
                    }
                    Err(e) => {
                        resume
                            .mark_failed(&self.job_name, pk, &e.to_string())
                            .await
                            .map_err(ArchiveError::from)?;

                        if let Some(cb) = checkpoint_cb {
                            if let Err(cb_err) = cb(pk, LogStatus::Failed) {
                                warn!(pk = %pk, error = %cb_err, "checkpoint callback failed");
                            }
                        }

                        return Err(e);
                    }
                }
            }

            fetcher.update_checkpoint(batch.last().cloned().unwrap_or(PkValue::Int(0)));

            if self.settings.sleep_between_batches > 0.0 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(archive_core::CoreError::Cancelled("orchestrator.inter_batch_sleep".to_string()).into());
                    }
                    _ = sleep(Duration::from_secs_f64(self.settings.sleep_between_batches)) => {}
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_root_pk(
        &self,
        cancel: &CancellationToken,
        discovery: &RecordDiscovery<'_>,
        copy_phase: &CopyPhase,
        verifier: &Verifier,
        delete_phase: &DeletePhase,
        pk: &PkValue,
        summary: &mut ArchiveSummary,
    ) -> Result<(), ArchiveError> {
        let outcome = discovery
            .discover(self.source.as_ref(), vec![pk.clone()], cancel)
            .await
            .map_err(ArchiveError::from)?;

        if outcome.cancelled {
            return Err(archive_core::CoreError::Cancelled("discovery".to_string()).into());
        }

        let record_set = outcome.record_set;

        let copy_stats = copy_phase
            .copy(
                self.source.as_ref(),
                self.destination.as_ref(),
                &self.graph,
                &record_set,
                self.settings.disable_foreign_key_checks,
                cancel,
            )
            .await
            .map_err(ArchiveError::from)?;
        summary.record_copy(&copy_stats.rows_by_table);

        verifier
            .verify(self.source.as_ref(), self.destination.as_ref(), &self.graph, &record_set, cancel)
            .await
            .map_err(ArchiveError::from)?;

        let delete_stats = delete_phase
            .delete(self.source.as_ref(), &self.graph, &record_set, cancel)
            .await
            .map_err(ArchiveError::from)?;
        summary.record_delete(&delete_stats.rows_by_table);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{dialect::SqlDialect, DatabaseKind, DbError};
    use model::{core::value::Value, DependencyKind, Relation, ReplicationStatus, RowData};

    struct StubAdapter;

    #[async_trait]
    impl SqlAdapter for StubAdapter {
        fn kind(&self) -> DatabaseKind {
            DatabaseKind::MySql
        }
        fn dialect(&self) -> SqlDialect {
            SqlDialect::MySql
        }
        async fn exec(&self, _sql: &str, _params: &[Value]) -> Result<u64, DbError> {
            Ok(0)
        }
        async fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<RowData>, DbError> {
            Ok(vec![])
        }
        async fn table_exists(&self, _table: &str) -> Result<bool, DbError> {
            Ok(true)
        }
        async fn list_tables(&self) -> Result<Vec<String>, DbError> {
            Ok(vec![])
        }
        async fn copy_all(
            &self,
            _ops: Vec<connectors::CopyTableOp>,
            _disable_fk_checks: bool,
        ) -> Result<connectors::CopyStats, DbError> {
            Ok(connectors::CopyStats::default())
        }
        async fn replication_status(&self) -> Result<ReplicationStatus, DbError> {
            Ok(ReplicationStatus::default())
        }
    }

    fn two_level_spec() -> JobSpec {
        JobSpec::new("customers", "id").with_relation(Relation {
            table: "orders".to_string(),
            primary_key: "id".to_string(),
            foreign_key: "customer_id".to_string(),
            dependency_type: DependencyKind::OneToMany,
            relations: vec![],
        })
    }

    #[test]
    fn initialize_fails_fast_when_replica_monitoring_has_no_handle() {
        let mut settings = RuntimeSettings::default();
        settings.replica_enabled = true;

        let result = Orchestrator::initialize(
            "job-1",
            two_level_spec(),
            settings,
            Arc::new(StubAdapter),
            Arc::new(StubAdapter),
            None,
        );

        assert!(matches!(result, Err(ArchiveError::Spec(_))));
    }

    #[test]
    fn initialize_precomputes_parent_first_copy_order() {
        let orchestrator = Orchestrator::initialize(
            "job-1",
            two_level_spec(),
            RuntimeSettings::default(),
            Arc::new(StubAdapter),
            Arc::new(StubAdapter),
            None,
        )
        .unwrap();

        let order = orchestrator.copy_order();
        let customers_idx = order.iter().position(|t| t == "customers").unwrap();
        let orders_idx = order.iter().position(|t| t == "orders").unwrap();
        assert!(customers_idx < orders_idx);
        assert_eq!(orchestrator.delete_order(), {
            let mut reversed = order.to_vec();
            reversed.reverse();
            reversed
        });
    }

    #[test]
    fn initialize_rejects_cyclic_graph() {
        // A relation whose own table is its declared root table collides
        // with the root node, which `Graph::build` reports as a conflicting
        // re-declaration rather than a cycle per se, but both are SpecErrors
        // the orchestrator must refuse to start with.
        let spec = JobSpec::new("customers", "id").with_relation(Relation {
            table: "customers".to_string(),
            primary_key: "id".to_string(),
            foreign_key: "referred_by".to_string(),
            dependency_type: DependencyKind::OneToOne,
            relations: vec![],
        });

        let result = Orchestrator::initialize(
            "job-1",
            spec,
            RuntimeSettings::default(),
            Arc::new(StubAdapter),
            Arc::new(StubAdapter),
            None,
        );

        assert!(result.is_err());
    }
}
