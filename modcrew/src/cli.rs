//! CLI argument parsing for modernization runs.

use std::path::PathBuf;

use clap::Parser;

use crate::config::RunConfig;
use crate::error::OrchestrateError;
use crate::phase::Phase;

/// Modernization crew orchestrator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "modcrew",
    version,
    about = "Runs a crew of analysis, modernization, qa, and documentation agents against a target codebase"
)]
pub struct Args {
    /// Root of the target codebase
    #[arg(long)]
    pub project_path: PathBuf,

    /// Subsystem-of-interest path, passed through to relevant work units
    #[arg(long)]
    pub watchdog_path: PathBuf,

    /// Comma-separated phases to execute
    #[arg(long, default_value = "analysis,modernization,qa,documentation")]
    pub phases: String,

    /// Directory receiving JSON artifacts
    #[arg(long, default_value = "./OUTPUT")]
    pub output_dir: PathBuf,

    /// Simulate the run: no agent is invoked, no artifact is written
    #[arg(long)]
    pub dry_run: bool,

    /// Record failures and keep executing instead of aborting the run
    #[arg(long)]
    pub continue_on_error: bool,

    /// Increase log detail (does not affect control flow or outputs)
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    /// Parse the comma-separated phase list, deduplicating repeats.
    pub fn parse_phases(&self) -> Result<Vec<Phase>, OrchestrateError> {
        let mut phases = Vec::new();
        for name in self.phases.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let phase = Phase::parse(name)?;
            if !phases.contains(&phase) {
                phases.push(phase);
            }
        }
        Ok(phases)
    }
}

impl TryFrom<Args> for RunConfig {
    type Error = OrchestrateError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let phases = args.parse_phases()?;
        Ok(RunConfig {
            project_path: args.project_path,
            watchdog_path: args.watchdog_path,
            phases,
            output_dir: args.output_dir,
            dry_run: args.dry_run,
            continue_on_error: args.continue_on_error,
            verbose: args.verbose,
        })
    }
}
