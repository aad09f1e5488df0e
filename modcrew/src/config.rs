//! Run configuration threaded explicitly through the orchestrator.

use std::path::PathBuf;

use crate::phase::Phase;

/// Everything one run needs to know, passed from the CLI down to the phase
/// runner and executors. No process-global state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the target codebase.
    pub project_path: PathBuf,
    /// Subsystem-of-interest path, forwarded to work units as context.
    pub watchdog_path: PathBuf,
    /// Phases to execute; always run in canonical order.
    pub phases: Vec<Phase>,
    /// Directory receiving JSON artifacts.
    pub output_dir: PathBuf,
    /// Simulate execution without invoking executors or writing artifacts.
    pub dry_run: bool,
    /// Record failures and keep going instead of aborting the run.
    pub continue_on_error: bool,
    /// More console detail; never changes control flow or outputs.
    pub verbose: bool,
}

impl RunConfig {
    /// Configuration with all phases selected and all flags off.
    pub fn new(project_path: impl Into<PathBuf>, watchdog_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            watchdog_path: watchdog_path.into(),
            phases: Phase::ALL.to_vec(),
            output_dir: PathBuf::from("./OUTPUT"),
            dry_run: false,
            continue_on_error: false,
            verbose: false,
        }
    }
}
