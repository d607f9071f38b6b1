//! Preflight Checker (§4.10): pre-run validation of schema shape (engine,
//! indexes, triggers, FK coverage) against the source database, targeting
//! the SQL-standard `information_schema` views (§6.2).

use crate::error::{CoreError, PreflightError};
use connectors::{dialect::SqlDialect, SqlAdapter};
use graph::Graph;
use model::core::value::Value;
use tracing::warn;

/// A `DELETE ... ON CASCADE` rule touching a graph table, surfaced as a
/// warning (check 6) rather than a failure.
#[derive(Debug, Clone)]
pub struct CascadeWarning {
    pub constraint_name: String,
    pub table: String,
    pub referenced_table: String,
}

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub cascade_warnings: Vec<CascadeWarning>,
    pub trigger_warnings: Vec<String>,
}

pub struct PreflightChecker {
    dialect: SqlDialect,
    force_triggers: bool,
}

impl PreflightChecker {
    pub fn new(dialect: SqlDialect, force_triggers: bool) -> Self {
        PreflightChecker { dialect, force_triggers }
    }

    pub async fn run(&self, source: &dyn SqlAdapter, graph: &Graph) -> Result<PreflightReport, CoreError> {
        let tables: Vec<String> = graph.all_nodes().map(|n| n.name.clone()).collect();

        self.check_table_existence(source, &tables).await?;
        self.check_storage_engine(source, &tables).await?;
        self.check_fk_index_coverage(source, &tables).await?;
        self.check_fk_graph_coverage(source, &tables).await?;
        let trigger_warnings = self.check_delete_triggers(source, &tables).await?;
        let cascade_warnings = self.check_cascade_rules(source, &tables).await?;

        Ok(PreflightReport {
            cascade_warnings,
            trigger_warnings,
        })
    }

    /// Check 1: every graph table is present in the source schema.
    async fn check_table_existence(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<(), CoreError> {
        let mut missing = Vec::new();
        for table in tables {
            if !source.table_exists(table).await.map_err(CoreError::Db)? {
                missing.push(table.clone());
            }
        }
        if !missing.is_empty() {
            return Err(CoreError::Preflight(PreflightError {
                check: "TABLE_EXISTENCE",
                message: "graph table(s) not found in source schema".to_string(),
                tables: missing,
                details: vec![],
            }));
        }
        Ok(())
    }

    /// Check 2: every graph table uses the transactional, row-locking
    /// engine (InnoDB). Postgres has no engine concept, so this check
    /// trivially passes there.
    async fn check_storage_engine(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<(), CoreError> {
        if self.dialect != SqlDialect::MySql || tables.is_empty() {
            return Ok(());
        }

        let placeholders = self.dialect.placeholders(0, tables.len());
        let sql = format!(
            "SELECT TABLE_NAME, ENGINE FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME IN ({placeholders})"
        );
        let params: Vec<Value> = tables.iter().map(|t| Value::String(t.clone())).collect();
        let rows = source.query(&sql, &params).await.map_err(CoreError::Db)?;

        let mut offenders = Vec::new();
        let mut details = Vec::new();
        for row in rows {
            let table = row.get_value("TABLE_NAME").as_string().unwrap_or_default();
            let engine = row.get_value("ENGINE").as_string().unwrap_or_default();
            if !engine.eq_ignore_ascii_case("InnoDB") {
                details.push(format!("{table} uses engine {engine}"));
                offenders.push(table);
            }
        }

        if !offenders.is_empty() {
            return Err(CoreError::Preflight(PreflightError {
                check: "STORAGE_ENGINE",
                message: "graph table(s) do not use InnoDB".to_string(),
                tables: offenders,
                details,
            }));
        }
        Ok(())
    }

    /// Check 3: every FK referencing column on a graph table is backed by
    /// at least one index (delete performance guarantee).
    async fn check_fk_index_coverage(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<(), CoreError> {
        if tables.is_empty() {
            return Ok(());
        }

        let fk_columns = self.referencing_columns(source, tables).await?;
        let mut offenders = Vec::new();

        for (table, column) in &fk_columns {
            let indexed = self.column_is_indexed(source, table, column).await?;
            if !indexed {
                offenders.push(format!("{table}.{column}"));
            }
        }

        if !offenders.is_empty() {
            return Err(CoreError::Preflight(PreflightError {
                check: "FK_INDEX_CHECK",
                message: "FK referencing column(s) lack a covering index".to_string(),
                tables: offenders,
                details: vec![],
            }));
        }
        Ok(())
    }

    /// Check 4: every FK whose referenced table is in the graph must have
    /// its referencing table also in the graph, or a source delete would
    /// later be blocked by RESTRICT / widen silently under CASCADE.
    async fn check_fk_graph_coverage(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<(), CoreError> {
        let constraints = self.foreign_keys_referencing(source, tables).await?;
        let table_set: std::collections::HashSet<&str> = tables.iter().map(String::as_str).collect();

        let mut offenders: Vec<String> = Vec::new();
        let mut details = Vec::new();
        for fk in &constraints {
            if !table_set.contains(fk.table.as_str()) {
                offenders.push(format!("{} (references {})", fk.table, fk.referenced_table));
                details.push(format!(
                    "{}.{} -> {}.{} is not covered by the graph",
                    fk.table, fk.column, fk.referenced_table, fk.referenced_column
                ));
            }
        }

        if !offenders.is_empty() {
            return Err(CoreError::Preflight(PreflightError {
                check: "FK_GRAPH_COVERAGE",
                message: "referencing table(s) outside the graph point at graph tables".to_string(),
                tables: offenders,
                details,
            }));
        }
        Ok(())
    }

    /// Check 5: DELETE triggers on any graph table. Fatal unless
    /// `force_triggers` downgrades it to a warning.
    async fn check_delete_triggers(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<Vec<String>, CoreError> {
        if tables.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = self.dialect.placeholders(0, tables.len());
        let sql = format!(
            "SELECT TRIGGER_NAME, EVENT_OBJECT_TABLE FROM information_schema.TRIGGERS \
             WHERE EVENT_MANIPULATION = 'DELETE' AND EVENT_OBJECT_TABLE IN ({placeholders})"
        );
        let params: Vec<Value> = tables.iter().map(|t| Value::String(t.clone())).collect();
        let rows = source.query(&sql, &params).await.map_err(CoreError::Db)?;

        let mut found = Vec::new();
        let mut offenders = Vec::new();
        for row in rows {
            let table = row.get_value("EVENT_OBJECT_TABLE").as_string().unwrap_or_default();
            let trigger = row.get_value("TRIGGER_NAME").as_string().unwrap_or_default();
            found.push(format!("{table}: DELETE trigger '{trigger}'"));
            offenders.push(table);
        }

        if found.is_empty() {
            return Ok(vec![]);
        }

        if self.force_triggers {
            for message in &found {
                warn!(%message, "ignoring DELETE trigger on graph table (force_triggers enabled)");
            }
            return Ok(found);
        }

        Err(CoreError::Preflight(PreflightError {
            check: "DELETE_TRIGGERS",
            message: "graph table(s) carry a DELETE trigger".to_string(),
            tables: offenders,
            details: found,
        }))
    }

    /// Check 6: list all `ON DELETE CASCADE` FKs touching graph tables.
    /// Informational only — never fails the run.
    async fn check_cascade_rules(&self, source: &dyn SqlAdapter, tables: &[String]) -> Result<Vec<CascadeWarning>, CoreError> {
        if tables.is_empty() {
            return Ok(vec![]);
        }

        let first = self.dialect.placeholders(0, tables.len());
        let second = self.dialect.placeholders(tables.len(), tables.len());
        let sql = format!(
            "SELECT rc.CONSTRAINT_NAME, kcu.TABLE_NAME, kcu.REFERENCED_TABLE_NAME \
             FROM information_schema.REFERENTIAL_CONSTRAINTS rc \
             JOIN information_schema.KEY_COLUMN_USAGE kcu ON kcu.CONSTRAINT_NAME = rc.CONSTRAINT_NAME \
             WHERE rc.DELETE_RULE = 'CASCADE' AND (kcu.TABLE_NAME IN ({first}) OR kcu.REFERENCED_TABLE_NAME IN ({second}))"
        );
        let mut params: Vec<Value> = tables.iter().map(|t| Value::String(t.clone())).collect();
        params.extend(tables.iter().map(|t| Value::String(t.clone())));

        let rows = source.query(&sql, &params).await.map_err(CoreError::Db)?;
        Ok(rows
            .into_iter()
            .map(|row| CascadeWarning {
                constraint_name: row.get_value("CONSTRAINT_NAME").as_string().unwrap_or_default(),
                table: row.get_value("TABLE_NAME").as_string().unwrap_or_default(),
                referenced_table: row.get_value("REFERENCED_TABLE_NAME").as_string().unwrap_or_default(),
            })
            .collect())
    }

    async fn referencing_columns(
        &self,
        source: &dyn SqlAdapter,
        tables: &[String],
    ) -> Result<Vec<(String, String)>, CoreError> {
        let placeholders = self.dialect.placeholders(0, tables.len());
        let sql = format!(
            "SELECT TABLE_NAME, COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
             WHERE REFERENCED_TABLE_NAME IS NOT NULL AND TABLE_NAME IN ({placeholders})"
        );
        let params: Vec<Value> = tables.iter().map(|t| Value::String(t.clone())).collect();
        let rows = source.query(&sql, &params).await.map_err(CoreError::Db)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get_value("TABLE_NAME").as_string().unwrap_or_default(),
                    row.get_value("COLUMN_NAME").as_string().unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn column_is_indexed(&self, source: &dyn SqlAdapter, table: &str, column: &str) -> Result<bool, CoreError> {
        let sql = match self.dialect {
            SqlDialect::MySql => {
                "SELECT COUNT(*) AS cnt FROM information_schema.STATISTICS \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?"
            }
            SqlDialect::Postgres => {
                "SELECT COUNT(*) AS cnt FROM pg_indexes WHERE tablename = $1 AND indexdef LIKE '%' || $2 || '%'"
            }
        };
        let rows = source
            .query(sql, &[Value::String(table.to_string()), Value::String(column.to_string())])
            .await
            .map_err(CoreError::Db)?;

        Ok(rows.first().map(|r| r.get_value("cnt").as_i64().unwrap_or(0)).unwrap_or(0) > 0)
    }

    async fn foreign_keys_referencing(
        &self,
        source: &dyn SqlAdapter,
        tables: &[String],
    ) -> Result<Vec<connectors::metadata::ForeignKeyMetadata>, CoreError> {
        let placeholders = self.dialect.placeholders(0, tables.len());
        let sql = format!(
            "SELECT CONSTRAINT_NAME, TABLE_NAME, COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE REFERENCED_TABLE_NAME IN ({placeholders})"
        );
        let params: Vec<Value> = tables.iter().map(|t| Value::String(t.clone())).collect();
        let rows = source.query(&sql, &params).await.map_err(CoreError::Db)?;

        Ok(rows
            .into_iter()
            .map(|row| connectors::metadata::ForeignKeyMetadata {
                constraint_name: row.get_value("CONSTRAINT_NAME").as_string().unwrap_or_default(),
                table: row.get_value("TABLE_NAME").as_string().unwrap_or_default(),
                column: row.get_value("COLUMN_NAME").as_string().unwrap_or_default(),
                referenced_table: row.get_value("REFERENCED_TABLE_NAME").as_string().unwrap_or_default(),
                referenced_column: row.get_value("REFERENCED_COLUMN_NAME").as_string().unwrap_or_default(),
            })
            .collect())
    }
}
