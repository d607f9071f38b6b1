use clap::Parser;
use commands::Commands;
use config::LoadedJob;
use error::CliError;
use orchestrator::{ArchiveSummary, Orchestrator};
use shutdown::{ExitCode, ShutdownCoordinator};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "archivectl", version = "0.1.0", about = "Relational archive orchestration engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let exit_code = match run_cli().await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => {
            info!("application shutdown gracefully");
            ExitCode::ShutdownRequested
        }
        Err(e) => {
            tracing::error!(error = %e, "application error");
            ExitCode::GeneralError
        }
    };

    process::exit(exit_code.as_i32());
}

async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let cancel = CancellationToken::new();
    let shutdown_coordinator = ShutdownCoordinator::new(cancel.clone());
    shutdown_coordinator.register_handlers();

    match cli.command {
        Commands::Run {
            config,
            env_file,
            skip_preflight,
            output,
        } => run_job(&config, env_file.as_deref(), skip_preflight, output.as_deref(), cancel).await,
        Commands::Resume {
            config,
            env_file,
            output,
        } => {
            // The Resume Store always checks for an existing checkpoint on
            // `execute`, so resuming is the same code path as `run` with
            // preflight skipped (the schema was already validated once).
            run_job(&config, env_file.as_deref(), true, output.as_deref(), cancel).await
        }
        Commands::Preflight { config, env_file } => preflight_job(&config, env_file.as_deref()).await,
        Commands::Validate { config, env_file } => validate_job(&config, env_file.as_deref()).await,
    }
}

async fn load_job(config: &str, env_file: Option<&str>) -> Result<LoadedJob, CliError> {
    Ok(config::load_from_strs(config, env_file)?)
}

async fn run_job(
    config: &str,
    env_file: Option<&str>,
    skip_preflight: bool,
    output: Option<&str>,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let job = load_job(config, env_file).await?;

    info!(job = %job.job_name, root_table = %job.spec.root_table, "loading archive job");

    let source = conn::connect(&job.connections.source).await?;
    let destination = conn::connect(&job.connections.destination).await?;
    let replica = match job.connections.replica.as_deref() {
        Some(url) => Some(conn::connect(url).await?),
        None => None,
    };

    let force_triggers = job.runtime.force_triggers;

    let orchestrator = Orchestrator::initialize(
        job.job_name.clone(),
        job.spec,
        job.runtime,
        source.clone(),
        destination,
        replica,
    )?;

    if !skip_preflight {
        let checker = archive_core::PreflightChecker::new(source.dialect(), force_triggers);
        let report = checker.run(source.as_ref(), orchestrator.graph()).await?;
        output::print_preflight_report(&report);
    }

    let summary = orchestrator.execute(cancel, None).await?;
    report_summary(&summary, output).await?;

    if !summary.success {
        return Err(CliError::Unexpected("archive run did not complete successfully".to_string()));
    }
    Ok(())
}

async fn preflight_job(config: &str, env_file: Option<&str>) -> Result<(), CliError> {
    let job = load_job(config, env_file).await?;
    let source = conn::connect(&job.connections.source).await?;
    let graph = graph::Graph::build(&job.spec).map_err(archive_core::CoreError::from)?;

    let checker = archive_core::PreflightChecker::new(source.dialect(), job.runtime.force_triggers);
    let report = checker.run(source.as_ref(), &graph).await?;
    output::print_preflight_report(&report);
    Ok(())
}

async fn validate_job(config: &str, env_file: Option<&str>) -> Result<(), CliError> {
    let job = load_job(config, env_file).await?;
    graph::Graph::build(&job.spec).map_err(archive_core::CoreError::from)?;
    println!("job '{}' is valid: {} table(s) in the dependency graph", job.job_name, job.spec.flatten().len() + 1);
    Ok(())
}

async fn report_summary(summary: &ArchiveSummary, output: Option<&str>) -> Result<(), CliError> {
    match output {
        Some(path) => output::write_summary(summary, path).await?,
        None => {
            output::print_summary_table(summary);
        }
    }
    Ok(())
}
