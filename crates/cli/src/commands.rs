use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Runs an archive job to completion (or until cancelled).
    Run {
        #[arg(long, help = "Job file path (.yaml/.yml/.json)")]
        config: String,

        #[arg(long, help = "Optional .env-style file overlaying connection placeholders")]
        env_file: Option<String>,

        #[arg(long, help = "Skip the preflight schema check before running")]
        skip_preflight: bool,

        #[arg(
            long,
            help = "If specified, writes the run summary as JSON to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Resumes a previously interrupted archive job from its last checkpoint.
    /// Equivalent to `run`: the Resume Store always checks for an existing
    /// checkpoint, this subcommand exists only to make operator intent explicit.
    Resume {
        #[arg(long, help = "Job file path (.yaml/.yml/.json)")]
        config: String,

        #[arg(long, help = "Optional .env-style file overlaying connection placeholders")]
        env_file: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the run summary as JSON to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Runs the Preflight Checker against the source database without
    /// copying or deleting anything.
    Preflight {
        #[arg(long, help = "Job file path (.yaml/.yml/.json)")]
        config: String,

        #[arg(long, help = "Optional .env-style file overlaying connection placeholders")]
        env_file: Option<String>,
    },
    /// Parses and shape-validates a job file without connecting to any
    /// database.
    Validate {
        #[arg(long, help = "Job file path (.yaml/.yml/.json)")]
        config: String,

        #[arg(long, help = "Optional .env-style file overlaying connection placeholders")]
        env_file: Option<String>,
    },
}
