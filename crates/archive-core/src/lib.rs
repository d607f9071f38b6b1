//! The nine components of §4 wired into one crate: Root ID Fetcher,
//! Record Discovery, Copy Phase, Verifier, Delete Phase, Resume Store,
//! Lag Monitor and Preflight Checker, all operating over a
//! [`graph::Graph`] built from a `model::JobSpec`.

pub mod copy;
pub mod delete;
pub mod diag;
pub mod discovery;
pub mod error;
pub mod lag;
pub mod preflight;
pub mod resume;
pub mod root_fetcher;
pub mod verify;

pub use copy::CopyPhase;
pub use delete::{DeletePhase, DeleteStats};
pub use discovery::{DiscoveryOutcome, RecordDiscovery};
pub use error::{CoreError, MismatchKind, PreflightError, ResumeError};
pub use lag::{LagCheck, LagMonitor};
pub use preflight::{CascadeWarning, PreflightChecker, PreflightReport};
pub use resume::ResumeStore;
pub use root_fetcher::RootIdFetcher;
pub use verify::{VerifyStats, Verifier};
