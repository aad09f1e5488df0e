//! Sequential execution of one phase's work units.
//!
//! The runner owns failure containment: executors may fail however they
//! like, but past this boundary a failed unit is a [`TaskFailure`] record,
//! never a propagated error. Only persistence problems escape, because a
//! lost checkpoint cannot be papered over.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::json;

use modcrew_sdk::{
    log_debug, log_phase_complete, log_phase_start, log_task_complete, log_task_failed,
    log_task_start,
};

use crate::artifacts::ArtifactStore;
use crate::config::RunConfig;
use crate::error::OrchestrateError;
use crate::executor::InputSet;
use crate::graph::{PhasePlan, WorkUnit};
use crate::outcome::{FailureKind, ResultMap, TaskFailure, TaskOutcome, TaskResult};
use crate::phase::{PhaseOutcome, PhaseStatus};
use crate::registry::AgentRegistry;

/// Executes the work units of one phase strictly in declared order.
pub struct PhaseRunner<'a> {
    registry: &'a AgentRegistry,
    config: &'a RunConfig,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(registry: &'a AgentRegistry, config: &'a RunConfig) -> Self {
        Self { registry, config }
    }

    /// Run every unit of `plan`, recording outcomes into `prior` and the
    /// artifact store.
    ///
    /// Always returns a phase outcome; the second element is set only when a
    /// persistence write failed, in which case the phase was cut short and
    /// the caller must abort the run.
    pub async fn run(
        &self,
        plan: &PhasePlan,
        prior: &mut ResultMap,
        store: &mut ArtifactStore,
    ) -> (PhaseOutcome, Option<OrchestrateError>) {
        log_phase_start!(plan.phase.name(), plan.units.len());

        let mut succeeded = 0;
        let mut failed = 0;
        let mut failures = Vec::new();
        let mut aborted = false;
        let mut persistence_failure = None;

        for unit in &plan.units {
            log_task_start!(
                plan.phase.name(),
                unit.id,
                unit.agent,
                unit.description.trim()
            );

            let outcome = if self.config.dry_run {
                synthetic_outcome(unit)
            } else {
                self.execute_unit(unit, prior).await
            };

            if !self.config.dry_run {
                if let Err(err) = store.record(unit, &outcome).await {
                    persistence_failure = Some(err);
                    aborted = true;
                    // The outcome exists but its checkpoint does not; count
                    // it as lost and stop.
                    break;
                }
            }

            let unit_failed = !outcome.succeeded();
            match &outcome {
                TaskOutcome::Completed(result) => {
                    succeeded += 1;
                    if self.config.verbose {
                        log_debug!("unit '{}' finished in {}ms", unit.id, result.duration_ms);
                    }
                    log_task_complete!(unit.id, format!("{}ms", result.duration_ms));
                }
                TaskOutcome::Failed(failure) => {
                    failed += 1;
                    failures.push(failure.clone());
                    log_task_failed!(unit.id, failure.message);
                }
            }

            prior.insert(unit.id.clone(), outcome);
            if unit_failed && !self.config.continue_on_error {
                aborted = true;
                break;
            }
        }

        let status = if aborted {
            PhaseStatus::Failed
        } else if failed > 0 {
            PhaseStatus::PartiallyFailed
        } else {
            PhaseStatus::Succeeded
        };
        log_phase_complete!(plan.phase.name(), status.name());

        (
            PhaseOutcome {
                phase: plan.phase,
                status,
                succeeded,
                failed,
                failures,
            },
            persistence_failure,
        )
    }

    /// Invoke the unit's executor, containing any error as a failure record.
    async fn execute_unit(&self, unit: &WorkUnit, prior: &ResultMap) -> TaskOutcome {
        let inputs = self.resolve_inputs(unit, prior);

        let executor = match self.registry.resolve(&unit.agent) {
            Ok(executor) => executor,
            Err(err) => {
                return TaskOutcome::Failed(TaskFailure {
                    unit: unit.id.clone(),
                    kind: FailureKind::Execution,
                    message: err.to_string(),
                    recoverable: self.config.continue_on_error,
                })
            }
        };

        let started = Instant::now();
        match executor.execute(unit, &inputs).await {
            Ok(payload) => TaskOutcome::Completed(TaskResult {
                unit: unit.id.clone(),
                payload,
                duration_ms: started.elapsed().as_millis() as u64,
                success: true,
            }),
            Err(err) => TaskOutcome::Failed(TaskFailure {
                unit: unit.id.clone(),
                kind: FailureKind::Execution,
                message: format!("{:#}", err),
                recoverable: self.config.continue_on_error,
            }),
        }
    }

    /// Gather upstream payloads for a unit. Failed or missing producers get
    /// no entry: downstream units see an absent input, not an error.
    fn resolve_inputs(&self, unit: &WorkUnit, prior: &ResultMap) -> InputSet {
        let mut upstream = HashMap::new();
        for input in &unit.inputs {
            if let Some(TaskOutcome::Completed(result)) = prior.get(&input.unit) {
                upstream.insert(input.unit.clone(), result.payload.clone());
            }
        }
        InputSet {
            project_path: self.config.project_path.clone(),
            watchdog_path: self.config.watchdog_path.clone(),
            upstream,
        }
    }
}

/// Dry-run stand-in for a unit's result. Never touches an executor.
fn synthetic_outcome(unit: &WorkUnit) -> TaskOutcome {
    TaskOutcome::Completed(TaskResult {
        unit: unit.id.clone(),
        payload: json!({
            "status": "would execute",
            "agent": unit.agent,
            "expected_output": unit.expected_output,
        }),
        duration_ms: 0,
        success: true,
    })
}
