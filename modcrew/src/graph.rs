//! Canonical task graph construction and phase selection.
//!
//! The full graph is declared in `config/tasks.yaml` and parsed once per run.
//! Selection filters it down to the requested phases while always preserving
//! canonical phase order, then re-checks that every required input is still
//! produced inside the filtered set.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::OrchestrateError;
use crate::phase::Phase;

const CANONICAL_TASKS: &str = include_str!("../config/tasks.yaml");

/// Reference to an upstream work unit's output.
#[derive(Debug, Clone, Deserialize)]
pub struct InputRef {
    /// Producing work unit id.
    pub unit: String,
    /// Required inputs must resolve within the selected phases; optional
    /// inputs are dropped when their producer is not part of the run.
    #[serde(default)]
    pub required: bool,
}

/// One unit of orchestrated work bound to an agent role.
///
/// Immutable after construction; execution state lives in
/// [`TaskOutcome`](crate::outcome::TaskOutcome) records, never here.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub id: String,
    pub phase: Phase,
    pub agent: String,
    pub description: String,
    pub inputs: Vec<InputRef>,
    /// Schema tag the executor is asked to produce.
    pub expected_output: String,
    /// Artifact file name, when this unit's outcome is persisted.
    pub output_file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnitConfig {
    id: String,
    agent: String,
    description: String,
    #[serde(default)]
    inputs: Vec<InputRef>,
    expected_output: String,
    #[serde(default)]
    output_file: Option<String>,
}

/// The ordered work units of one phase.
#[derive(Debug, Clone)]
pub struct PhasePlan {
    pub phase: Phase,
    pub units: Vec<WorkUnit>,
}

/// Ordered, phase-scoped sequences of work units.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub phases: Vec<PhasePlan>,
}

impl TaskGraph {
    /// Parse the embedded canonical graph.
    pub fn canonical() -> Result<Self, OrchestrateError> {
        Self::from_yaml(CANONICAL_TASKS)
    }

    /// Parse a graph from YAML: a mapping from phase name to unit list.
    /// Phases absent from the document are treated as empty.
    pub fn from_yaml(source: &str) -> Result<Self, OrchestrateError> {
        let mut config: HashMap<Phase, Vec<UnitConfig>> = serde_yaml::from_str(source)
            .map_err(|e| OrchestrateError::config(format!("invalid task configuration: {}", e)))?;

        let mut phases = Vec::new();
        for phase in Phase::ALL {
            let units = config
                .remove(&phase)
                .unwrap_or_default()
                .into_iter()
                .map(|unit| WorkUnit {
                    id: unit.id,
                    phase,
                    agent: unit.agent,
                    description: unit.description,
                    inputs: unit.inputs,
                    expected_output: unit.expected_output,
                    output_file: unit.output_file,
                })
                .collect();
            phases.push(PhasePlan { phase, units });
        }

        let graph = Self { phases };
        graph.validate()?;
        Ok(graph)
    }

    /// Construction-time invariants: ids are unique and inputs reference
    /// only units that appear earlier in the graph.
    fn validate(&self) -> Result<(), OrchestrateError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for plan in &self.phases {
            for unit in &plan.units {
                for input in &unit.inputs {
                    if !seen.contains(input.unit.as_str()) {
                        return Err(OrchestrateError::config(format!(
                            "unit '{}' references '{}' which does not appear earlier in the graph",
                            unit.id, input.unit
                        )));
                    }
                }
                if !seen.insert(unit.id.as_str()) {
                    return Err(OrchestrateError::config(format!(
                        "duplicate work unit id '{}'",
                        unit.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Filter to the requested phases, preserving canonical order regardless
    /// of the order `requested` lists them in.
    ///
    /// # Errors
    ///
    /// Configuration error if a kept unit declares a required input whose
    /// producer is excluded by the selection. Optional inputs to excluded
    /// producers are silently dropped.
    pub fn select(&self, requested: &[Phase]) -> Result<TaskGraph, OrchestrateError> {
        let selected: HashSet<Phase> = requested.iter().copied().collect();
        let mut available: HashSet<&str> = HashSet::new();
        let mut phases = Vec::new();

        for plan in &self.phases {
            if !selected.contains(&plan.phase) {
                continue;
            }
            let mut units = Vec::new();
            for unit in &plan.units {
                for input in &unit.inputs {
                    if input.required && !available.contains(input.unit.as_str()) {
                        return Err(OrchestrateError::config(format!(
                            "unit '{}' requires input '{}' which is not produced by the selected phases",
                            unit.id, input.unit
                        )));
                    }
                }
                let inputs = unit
                    .inputs
                    .iter()
                    .filter(|input| available.contains(input.unit.as_str()))
                    .cloned()
                    .collect();
                available.insert(unit.id.as_str());
                units.push(WorkUnit {
                    inputs,
                    ..unit.clone()
                });
            }
            phases.push(PhasePlan {
                phase: plan.phase,
                units,
            });
        }

        Ok(TaskGraph { phases })
    }

    /// All units across all phases, in execution order.
    pub fn units(&self) -> impl Iterator<Item = &WorkUnit> {
        self.phases.iter().flat_map(|plan| plan.units.iter())
    }

    pub fn unit_count(&self) -> usize {
        self.phases.iter().map(|plan| plan.units.len()).sum()
    }
}
