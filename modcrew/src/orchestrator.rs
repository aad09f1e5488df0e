//! Top-level run driver: phase selection, dispatch, and aggregation.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use modcrew_sdk::{log_file_saved, log_info, log_phase_skipped, log_run_complete, log_run_start, log_warning};

use crate::artifacts::ArtifactStore;
use crate::config::RunConfig;
use crate::error::OrchestrateError;
use crate::graph::TaskGraph;
use crate::history::RunHistory;
use crate::outcome::ResultMap;
use crate::phase::{Phase, PhaseOutcome, PhaseStatus, RunStatus};
use crate::registry::AgentRegistry;
use crate::runner::PhaseRunner;

/// The top-level execution record for one orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    pub project_path: String,
    pub watchdog_path: String,
    pub status: RunStatus,
    /// One entry per canonical phase; never-dispatched phases are skipped.
    pub phases: Vec<PhaseOutcome>,
    pub dry_run: bool,
    pub continue_on_error: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

/// Drives one run end to end: validates configuration, builds and filters
/// the task graph, runs each selected phase in canonical order threading the
/// cumulative result map, and finalizes the run record.
pub struct Orchestrator {
    config: RunConfig,
    registry: AgentRegistry,
    graph: TaskGraph,
    history: Option<RunHistory>,
}

impl Orchestrator {
    /// Orchestrator over the canonical task graph.
    pub fn new(config: RunConfig, registry: AgentRegistry) -> Result<Self, OrchestrateError> {
        let graph = TaskGraph::canonical()?;
        Ok(Self {
            config,
            registry,
            graph,
            history: None,
        })
    }

    /// Record this run in the given history database.
    pub fn with_history(mut self, history: RunHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Execute the run.
    ///
    /// # Errors
    ///
    /// Configuration errors surface before any unit executes and leave no
    /// partial run behind. Persistence errors abort mid-run but the partial
    /// run record is still finalized before the error is returned.
    pub async fn run(&self) -> Result<Run, OrchestrateError> {
        self.validate_paths()?;
        let selected = self.graph.select(&self.config.phases)?;
        self.validate_roles(&selected)?;

        let run_id = Uuid::new_v4();
        let started_at = Local::now();
        let project_path = self.config.project_path.display().to_string();
        log_run_start!(run_id, project_path);
        log_info!(
            "run {}: {} phases, {} work units{}",
            run_id,
            selected.phases.len(),
            selected.unit_count(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        if let Some(history) = &self.history {
            if let Err(err) = history.insert_run(&run_id, &project_path, self.config.dry_run, started_at) {
                log_warning!("run history unavailable: {:#}", err);
            }
        }

        let mut store = ArtifactStore::new(&self.config.output_dir);
        let mut prior = ResultMap::new();
        let runner = PhaseRunner::new(&self.registry, &self.config);
        let mut reports: Vec<PhaseOutcome> = Vec::new();
        let mut persistence_failure: Option<OrchestrateError> = None;

        for plan in &selected.phases {
            let (outcome, persist_err) = runner.run(plan, &mut prior, &mut store).await;
            let phase_failed = outcome.status == PhaseStatus::Failed;
            reports.push(outcome);
            if let Some(err) = persist_err {
                persistence_failure = Some(err);
                break;
            }
            if phase_failed {
                break;
            }
        }

        // Every canonical phase gets an entry; the ones never dispatched
        // (unselected, or cut off by an abort) are skipped.
        let phases: Vec<PhaseOutcome> = Phase::ALL
            .iter()
            .map(|phase| {
                reports
                    .iter()
                    .find(|report| report.phase == *phase)
                    .cloned()
                    .unwrap_or_else(|| {
                        log_phase_skipped!(phase.name());
                        PhaseOutcome::skipped(*phase)
                    })
            })
            .collect();

        let mut status = aggregate_status(&phases);
        if persistence_failure.is_some() {
            status = RunStatus::Failed;
        }

        let run = Run {
            id: run_id,
            project_path,
            watchdog_path: self.config.watchdog_path.display().to_string(),
            status,
            phases,
            dry_run: self.config.dry_run,
            continue_on_error: self.config.continue_on_error,
            started_at,
            finished_at: Local::now(),
        };

        if !self.config.dry_run && persistence_failure.is_none() {
            let summary = serde_json::to_value(&run)
                .map_err(|e| OrchestrateError::persistence(&self.config.output_dir, e));
            match summary {
                Ok(summary) => match store.write_summary(&summary).await {
                    Ok(path) => log_file_saved!(path.display()),
                    Err(err) => persistence_failure = Some(err),
                },
                Err(err) => persistence_failure = Some(err),
            }
        }

        if let Some(history) = &self.history {
            if let Err(err) = history.finalize_run(&run) {
                log_warning!("failed to record run in history: {:#}", err);
            }
        }

        log_run_complete!(run.id, run.status.name());
        println!("\n{}", "=".repeat(80));
        print!("{}", render_summary(&run));
        println!("{}", "=".repeat(80));

        match persistence_failure {
            Some(err) => Err(err),
            None => Ok(run),
        }
    }

    fn validate_paths(&self) -> Result<(), OrchestrateError> {
        for (label, path) in [
            ("project path", &self.config.project_path),
            ("watchdog path", &self.config.watchdog_path),
        ] {
            if !path.is_dir() {
                return Err(OrchestrateError::config(format!(
                    "{} '{}' is not a directory",
                    label,
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// Every unit's role must be known before anything executes; for real
    /// runs the role must also resolve to an executor.
    fn validate_roles(&self, selected: &TaskGraph) -> Result<(), OrchestrateError> {
        for unit in selected.units() {
            self.registry.ensure_role(&unit.agent)?;
            if !self.config.dry_run {
                self.registry.resolve(&unit.agent)?;
            }
        }
        Ok(())
    }
}

/// Run status is a pure function of the phase outcomes: any aborted phase
/// fails the run, any partial phase makes it partial, skipped phases are
/// neutral.
fn aggregate_status(phases: &[PhaseOutcome]) -> RunStatus {
    if phases.iter().any(|p| p.status == PhaseStatus::Failed) {
        RunStatus::Failed
    } else if phases
        .iter()
        .any(|p| p.status == PhaseStatus::PartiallyFailed)
    {
        RunStatus::PartiallyFailed
    } else {
        RunStatus::Succeeded
    }
}

/// User-facing run summary: per-phase counts, failure messages with their
/// originating unit, and the one-word run status.
pub fn render_summary(run: &Run) -> String {
    let mut out = String::new();
    for phase in &run.phases {
        let _ = writeln!(
            out,
            "{:<16} {:<18} {} succeeded, {} failed",
            phase.phase.name(),
            phase.status.name(),
            phase.succeeded,
            phase.failed
        );
        for failure in &phase.failures {
            let _ = writeln!(out, "    ✗ {}: {}", failure.unit, failure.message);
        }
    }
    let _ = writeln!(out, "\nRun {}: {}", run.id, run.status.name());
    out
}
