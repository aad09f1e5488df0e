//! Work unit execution outcomes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of executing one work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Producing work unit id.
    pub unit: String,
    /// Task-specific structured payload.
    pub payload: Value,
    /// Wall-clock execution time.
    pub duration_ms: u64,
    pub success: bool,
}

/// Classification of a contained work unit failure.
///
/// Configuration problems are raised before execution and persistence
/// problems abort the run, so the only kind that reaches a failure record is
/// an execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The executor failed to produce a usable result.
    Execution,
}

/// A contained failure produced while executing one work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Originating work unit id.
    pub unit: String,
    pub kind: FailureKind,
    pub message: String,
    /// Whether continue-on-error may proceed past this failure.
    pub recoverable: bool,
}

/// Exactly one outcome exists per executed work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed(TaskResult),
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn unit(&self) -> &str {
        match self {
            TaskOutcome::Completed(result) => &result.unit,
            TaskOutcome::Failed(failure) => &failure.unit,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }

    pub fn as_result(&self) -> Option<&TaskResult> {
        match self {
            TaskOutcome::Completed(result) => Some(result),
            TaskOutcome::Failed(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskOutcome::Completed(_) => None,
            TaskOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Outcomes accumulated across all phases executed so far, keyed by unit id.
pub type ResultMap = HashMap<String, TaskOutcome>;
