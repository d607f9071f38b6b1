use crate::error::CliError;
use archive_core::PreflightReport;
use orchestrator::ArchiveSummary;
use serde::Serialize;

#[derive(Serialize)]
struct SummaryReport<'a> {
    job_name: &'a str,
    success: bool,
    duration_secs: f64,
    root_pks_processed: u64,
    rows_copied: u64,
    rows_deleted: u64,
    rows_copied_by_table: &'a std::collections::HashMap<String, u64>,
    rows_deleted_by_table: &'a std::collections::HashMap<String, u64>,
    errors: &'a [String],
}

fn summary_json(summary: &ArchiveSummary) -> Result<String, CliError> {
    let report = SummaryReport {
        job_name: &summary.job_name,
        success: summary.success,
        duration_secs: summary.duration.as_secs_f64(),
        root_pks_processed: summary.root_pks_processed,
        rows_copied: summary.rows_copied(),
        rows_deleted: summary.rows_deleted(),
        rows_copied_by_table: &summary.rows_copied_by_table,
        rows_deleted_by_table: &summary.rows_deleted_by_table,
        errors: &summary.errors,
    };
    serde_json::to_string_pretty(&report).map_err(CliError::JsonSerialize)
}

pub async fn write_summary(summary: &ArchiveSummary, path: &str) -> Result<(), CliError> {
    let json = summary_json(summary)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

pub fn print_summary(summary: &ArchiveSummary) -> Result<(), CliError> {
    println!("{}", summary_json(summary)?);
    Ok(())
}

pub fn print_summary_table(summary: &ArchiveSummary) {
    println!("Archive job '{}'", summary.job_name);
    println!("-----------------------------");
    println!("{:<24} {}", "Success", summary.success);
    println!("{:<24} {:.2}s", "Duration", summary.duration.as_secs_f64());
    println!("{:<24} {}", "Root PKs processed", summary.root_pks_processed);
    println!("{:<24} {}", "Rows copied", summary.rows_copied());
    println!("{:<24} {}", "Rows deleted", summary.rows_deleted());
    if !summary.errors.is_empty() {
        println!("Errors:");
        for err in &summary.errors {
            println!("  - {err}");
        }
    }
}

pub fn print_preflight_report(report: &PreflightReport) {
    println!("Preflight checks passed.");
    if report.trigger_warnings.is_empty() && report.cascade_warnings.is_empty() {
        return;
    }
    for warning in &report.trigger_warnings {
        println!("warning: {warning}");
    }
    for cascade in &report.cascade_warnings {
        println!(
            "warning: {} cascades {} -> {}",
            cascade.constraint_name, cascade.table, cascade.referenced_table
        );
    }
}
