//! Phases, statuses, and per-phase outcome records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OrchestrateError;
use crate::outcome::TaskFailure;
use crate::utils::closest_match;

/// The four run phases, in canonical execution order.
///
/// Selection never reorders phases: whatever subset a caller requests runs in
/// the order below, so modernization work cannot precede the analysis it
/// consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Analysis,
    Modernization,
    Qa,
    Documentation,
}

impl Phase {
    /// All phases in canonical order.
    pub const ALL: [Phase; 4] = [
        Phase::Analysis,
        Phase::Modernization,
        Phase::Qa,
        Phase::Documentation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Analysis => "analysis",
            Phase::Modernization => "modernization",
            Phase::Qa => "qa",
            Phase::Documentation => "documentation",
        }
    }

    /// Parse a phase name, suggesting the closest valid name on a miss.
    pub fn parse(name: &str) -> Result<Phase, OrchestrateError> {
        let lowered = name.trim().to_ascii_lowercase();
        for phase in Phase::ALL {
            if phase.name() == lowered {
                return Ok(phase);
            }
        }
        let message = match closest_match(Phase::ALL.iter().map(|p| p.name()), &lowered) {
            Some(suggestion) => {
                format!("unknown phase '{}' (closest: '{}')", name, suggestion)
            }
            None => format!(
                "unknown phase '{}' (expected one of: analysis, modernization, qa, documentation)",
                name
            ),
        };
        Err(OrchestrateError::config(message))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Completion status of a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    Pending,
    Running,
    Succeeded,
    PartiallyFailed,
    Failed,
    Skipped,
}

impl PhaseStatus {
    pub fn name(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::Running => "running",
            PhaseStatus::Succeeded => "succeeded",
            PhaseStatus::PartiallyFailed => "partially-failed",
            PhaseStatus::Failed => "failed",
            PhaseStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final aggregated status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Succeeded,
    PartiallyFailed,
    Failed,
}

impl RunStatus {
    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::PartiallyFailed => "partially-failed",
            RunStatus::Failed => "failed",
        }
    }

    /// Process exit code for this status. Partial failure exits zero: the
    /// caller asked to continue past failures and got a finished run.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Succeeded | RunStatus::PartiallyFailed => 0,
            RunStatus::Failed => 1,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregated outcome of one phase within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<TaskFailure>,
}

impl PhaseOutcome {
    /// Record for a phase that was never dispatched.
    pub fn skipped(phase: Phase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Skipped,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }
}
