#[cfg(test)]
mod tests {
    use crate::{mysql_adapter, pg_adapter, reset_schemas, utils::*};
    use archive_core::{CoreError, PreflightChecker};
    use chrono::NaiveDate;
    use connectors::SqlAdapter;
    use graph::Graph;
    use model::core::value::Value;
    use model::{DependencyKind, JobSpec, Relation, RuntimeSettings, VerificationMethod};
    use orchestrator::Orchestrator;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn customers_orders_spec(predicate: &str) -> JobSpec {
        JobSpec::new("customers", "id")
            .with_where(predicate)
            .with_relation(Relation {
                table: "orders".to_string(),
                primary_key: "id".to_string(),
                foreign_key: "customer_id".to_string(),
                dependency_type: DependencyKind::OneToMany,
                relations: vec![],
            })
    }

    /// Scenario A — minimal two-level archive.
    #[traced_test]
    #[tokio::test]
    async fn scenario_a_minimal_two_level_archive() {
        reset_schemas().await;
        let source = mysql_adapter().await;
        let destination = pg_adapter().await;

        apply_ddl(source.as_ref(), CUSTOMERS_ORDERS_MYSQL_DDL).await;
        apply_ddl(destination.as_ref(), CUSTOMERS_ORDERS_PG_DDL).await;

        insert_row(
            source.as_ref(),
            "INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)",
            &[Value::Int(1), Value::String("Alice".into()), date(2023, 1, 1)],
        )
        .await;
        insert_row(
            source.as_ref(),
            "INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)",
            &[Value::Int(2), Value::String("Bob".into()), date(2024, 6, 1)],
        )
        .await;
        for (id, customer_id, total) in [(101i64, 1i64, 150.0), (102, 1, 75.0), (103, 2, 99.0)] {
            insert_row(
                source.as_ref(),
                "INSERT INTO orders (id, customer_id, total) VALUES (?, ?, ?)",
                &[Value::Int(id), Value::Int(customer_id), Value::Float(total)],
            )
            .await;
        }

        let spec = customers_orders_spec("created_at < '2024-01-01'");
        let orchestrator = Orchestrator::initialize(
            "scenario-a",
            spec,
            RuntimeSettings::default(),
            source.clone(),
            destination.clone(),
            None,
        )
        .unwrap();

        let summary = orchestrator.execute(CancellationToken::new(), None).await.unwrap();
        assert!(summary.success, "errors: {:?}", summary.errors);
        assert_eq!(summary.root_pks_processed, 1);

        assert_eq!(ids_in(source.as_ref(), "customers").await, vec![2]);
        assert_eq!(ids_in(source.as_ref(), "orders").await, vec![103]);
        assert_eq!(ids_in(destination.as_ref(), "customers").await, vec![1]);
        assert_eq!(ids_in(destination.as_ref(), "orders").await, vec![101, 102]);
    }

    /// Scenario B — deep chain A→B→C→D.
    #[traced_test]
    #[tokio::test]
    async fn scenario_b_deep_chain() {
        reset_schemas().await;
        let source = mysql_adapter().await;
        let destination = pg_adapter().await;

        apply_ddl(source.as_ref(), DEEP_CHAIN_MYSQL_DDL).await;
        apply_ddl(destination.as_ref(), DEEP_CHAIN_PG_DDL).await;

        insert_row(
            source.as_ref(),
            "INSERT INTO tbl_a (id, created_at) VALUES (?, ?)",
            &[Value::Int(1), date(2023, 1, 1)],
        )
        .await;
        insert_row(source.as_ref(), "INSERT INTO tbl_b (id, a_id) VALUES (?, ?)", &[Value::Int(10), Value::Int(1)]).await;
        insert_row(source.as_ref(), "INSERT INTO tbl_c (id, b_id) VALUES (?, ?)", &[Value::Int(100), Value::Int(10)]).await;
        insert_row(source.as_ref(), "INSERT INTO tbl_d (id, c_id) VALUES (?, ?)", &[Value::Int(1000), Value::Int(100)]).await;

        let spec = JobSpec::new("tbl_a", "id").with_where("1=1").with_relation(Relation {
            table: "tbl_b".to_string(),
            primary_key: "id".to_string(),
            foreign_key: "a_id".to_string(),
            dependency_type: DependencyKind::OneToOne,
            relations: vec![Relation {
                table: "tbl_c".to_string(),
                primary_key: "id".to_string(),
                foreign_key: "b_id".to_string(),
                dependency_type: DependencyKind::OneToOne,
                relations: vec![Relation {
                    table: "tbl_d".to_string(),
                    primary_key: "id".to_string(),
                    foreign_key: "c_id".to_string(),
                    dependency_type: DependencyKind::OneToOne,
                    relations: vec![],
                }],
            }],
        });

        let graph = Graph::build(&spec).unwrap();
        assert_eq!(graph.copy_order(), vec!["tbl_a", "tbl_b", "tbl_c", "tbl_d"]);
        assert_eq!(graph.delete_order(), vec!["tbl_d", "tbl_c", "tbl_b", "tbl_a"]);

        let orchestrator = Orchestrator::initialize(
            "scenario-b",
            spec,
            RuntimeSettings::default(),
            source.clone(),
            destination.clone(),
            None,
        )
        .unwrap();

        let summary = orchestrator.execute(CancellationToken::new(), None).await.unwrap();
        assert!(summary.success, "errors: {:?}", summary.errors);

        for table in ["tbl_a", "tbl_b", "tbl_c", "tbl_d"] {
            assert_eq!(row_count(source.as_ref(), table).await, 0, "{table} not emptied in source");
            assert_eq!(row_count(destination.as_ref(), table).await, 1, "{table} missing from destination");
        }
    }

    /// Scenario C — resume after crash. Uses five root PKs rather than two
    /// hundred; the behavior under test (monotonic checkpoint advance, no
    /// duplicate destination rows across a cancel + restart) does not
    /// depend on scale.
    #[traced_test]
    #[tokio::test]
    async fn scenario_c_resume_after_crash() {
        use std::sync::atomic::{AtomicU32, Ordering};

        reset_schemas().await;
        let source = mysql_adapter().await;
        let destination = pg_adapter().await;

        apply_ddl(source.as_ref(), CUSTOMERS_ORDERS_MYSQL_DDL).await;
        apply_ddl(destination.as_ref(), CUSTOMERS_ORDERS_PG_DDL).await;

        for id in 1..=5i64 {
            insert_row(
                source.as_ref(),
                "INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)",
                &[Value::Int(id), Value::String(format!("Customer {id}")), date(2023, 1, 1)],
            )
            .await;
            insert_row(
                source.as_ref(),
                "INSERT INTO orders (id, customer_id, total) VALUES (?, ?, ?)",
                &[Value::Int(100 + id), Value::Int(id), Value::Float(10.0 * id as f64)],
            )
            .await;
        }

        let spec = customers_orders_spec("1=1");
        let cancel = CancellationToken::new();
        let processed = AtomicU32::new(0);
        let cancel_clone = cancel.clone();
        let checkpoint_cb = move |_pk: &model::PkValue, status: model::LogStatus| {
            if status == model::LogStatus::Completed && processed.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                cancel_clone.cancel();
            }
            Ok(())
        };

        let orchestrator = Orchestrator::initialize(
            "scenario-c",
            spec.clone(),
            RuntimeSettings::default(),
            source.clone(),
            destination.clone(),
            None,
        )
        .unwrap();

        let first_summary = orchestrator.execute(cancel, Some(&checkpoint_cb)).await.unwrap();
        assert!(!first_summary.success, "first run should have been interrupted");
        assert_eq!(first_summary.root_pks_processed, 2);

        let resumed = Orchestrator::initialize(
            "scenario-c",
            spec,
            RuntimeSettings::default(),
            source.clone(),
            destination.clone(),
            None,
        )
        .unwrap();

        let second_summary = resumed.execute(CancellationToken::new(), None).await.unwrap();
        assert!(second_summary.success, "errors: {:?}", second_summary.errors);
        assert_eq!(second_summary.root_pks_processed, 3);

        assert_eq!(row_count(source.as_ref(), "customers").await, 0);
        assert_eq!(row_count(source.as_ref(), "orders").await, 0);

        let dest_ids = ids_in(destination.as_ref(), "customers").await;
        assert_eq!(dest_ids.len(), 5, "no root PK should be duplicated across the resume");
        let mut sorted = dest_ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, dest_ids, "destination must contain no duplicate root PKs");

        let resume_store = archive_core::ResumeStore::new(destination.as_ref());
        let checkpoint = resume_store.checkpoint("scenario-c").await.unwrap();
        assert_eq!(checkpoint, Some(5), "checkpoint must advance monotonically to the last processed root PK");
    }

    /// Scenario D — verification catches tampering.
    /// Runs Copy directly (bypassing the orchestrator) so a row can be
    /// mutated in the destination between copy and verify.
    #[traced_test]
    #[tokio::test]
    async fn scenario_d_verification_catches_tampering() {
        reset_schemas().await;
        let source = mysql_adapter().await;
        let destination = pg_adapter().await;

        apply_ddl(source.as_ref(), CUSTOMERS_ORDERS_MYSQL_DDL).await;
        apply_ddl(destination.as_ref(), CUSTOMERS_ORDERS_PG_DDL).await;

        insert_row(
            source.as_ref(),
            "INSERT INTO customers (id, name, created_at) VALUES (?, ?, ?)",
            &[Value::Int(1), Value::String("Alice".into()), date(2023, 1, 1)],
        )
        .await;
        insert_row(
            source.as_ref(),
            "INSERT INTO orders (id, customer_id, total) VALUES (?, ?, ?)",
            &[Value::Int(101), Value::Int(1), Value::Float(150.0)],
        )
        .await;

        let spec = customers_orders_spec("1=1");
        let graph = Graph::build(&spec).unwrap();
        let discovery = archive_core::RecordDiscovery::new(&graph, source.dialect(), 500);
        let cancel = CancellationToken::new();

        let outcome = discovery
            .discover(source.as_ref(), vec![model::PkValue::Int(1)], &cancel)
            .await
            .unwrap();

        let copy_phase = archive_core::CopyPhase::new(source.dialect(), 500);
        copy_phase
            .copy(source.as_ref(), destination.as_ref(), &graph, &outcome.record_set, false, &cancel)
            .await
            .unwrap();

        destination
            .exec("UPDATE customers SET name = 'Tampered' WHERE id = 1", &[])
            .await
            .unwrap();

        let verifier = archive_core::Verifier::new(VerificationMethod::Sha256, source.dialect(), 1000);
        let result = verifier
            .verify(source.as_ref(), destination.as_ref(), &graph, &outcome.record_set, &cancel)
            .await;

        match result {
            Err(CoreError::VerificationMismatch { table, .. }) => assert_eq!(table, "customers"),
            other => panic!("expected a verification mismatch, got {other:?}"),
        }

        // The source row must still exist: delete never ran for this root PK.
        assert_eq!(row_count(source.as_ref(), "customers").await, 1);
    }

    /// Scenario F — preflight rejects unsafe schema.
    #[traced_test]
    #[tokio::test]
    async fn scenario_f_preflight_rejects_unindexed_fk() {
        reset_schemas().await;
        let source = mysql_adapter().await;
        apply_ddl(source.as_ref(), UNINDEXED_FK_MYSQL_DDL).await;

        let spec = customers_orders_spec("1=1");
        let graph = Graph::build(&spec).unwrap();
        let checker = PreflightChecker::new(source.dialect(), false);

        let result = checker.run(source.as_ref(), &graph).await;
        match result {
            Err(CoreError::Preflight(err)) => {
                assert_eq!(err.check, "FK_INDEX_CHECK");
                assert!(err.tables.iter().any(|t| t == "orders.customer_id"));
            }
            other => panic!("expected FK_INDEX_CHECK preflight failure, got {other:?}"),
        }
    }

    /// Scenario E — replica lag backpressure.
    /// Exercised against a scripted fake replica rather than a real one:
    /// the behavior under test is `wait_for_lag`'s retry/backoff logic,
    /// not any particular driver's replication-status wire format.
    #[traced_test]
    #[tokio::test]
    async fn scenario_e_replica_lag_backpressure() {
        use crate::fakes::ScriptedReplicaAdapter;
        use archive_core::LagMonitor;
        use model::ReplicationStatus;
        use std::time::Duration;

        let probe = |lag: i64| ReplicationStatus {
            seconds_behind_primary: Some(lag),
            io_thread_running: Some(true),
            sql_thread_running: Some(true),
            last_error: None,
        };

        let replica = ScriptedReplicaAdapter::new(vec![probe(30), probe(30), probe(5)]);
        let monitor = LagMonitor::new(Some(&replica), 10, 1);
        let cancel = CancellationToken::new();

        let start = std::time::Instant::now();
        monitor.wait_for_lag(&cancel).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(replica.probes_consumed(), 3, "expected exactly three lag probes before acceptance");
        assert!(elapsed >= Duration::from_secs(2), "should have slept between the two over-threshold probes");
    }
}
