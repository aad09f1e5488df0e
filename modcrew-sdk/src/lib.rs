//! Shared log events and macros for modcrew runs.
//!
//! Workflows emit two kinds of output: structured [`RunLog`] events on stderr
//! (one JSON line per event, prefixed so a supervising process can pick them
//! out of mixed output) and human-readable colored console lines via the
//! `log_*` console macros.

use serde::{Deserialize, Serialize};

/// Structured events emitted over the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunLog {
    /// Run started
    RunStarted {
        run_id: String,
        project_path: String,
    },
    /// Run finished with its aggregated status
    RunCompleted {
        run_id: String,
        status: String,
    },
    /// Phase started, with its work unit count
    PhaseStarted {
        phase: String,
        units: usize,
    },
    /// Phase finished with its completion status
    PhaseCompleted {
        phase: String,
        status: String,
    },
    /// Phase was never dispatched
    PhaseSkipped {
        phase: String,
    },
    /// Work unit started
    TaskStarted {
        phase: String,
        unit: String,
        agent: String,
        description: String,
    },
    /// Work unit produced a result
    TaskCompleted {
        unit: String,
        summary: Option<String>,
    },
    /// Work unit produced a failure
    TaskFailed {
        unit: String,
        error: String,
    },
    /// Artifact document persisted
    ArtifactWritten {
        unit: String,
        path: String,
    },
}

impl RunLog {
    /// Emit this event to stderr as a tagged JSON line.
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("__MC_EVENT__:{}", json);
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_run_start {
    ($run_id:expr, $project:expr) => {
        $crate::RunLog::RunStarted {
            run_id: $run_id.to_string(),
            project_path: $project.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_run_complete {
    ($run_id:expr, $status:expr) => {
        $crate::RunLog::RunCompleted {
            run_id: $run_id.to_string(),
            status: $status.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_phase_start {
    ($phase:expr, $units:expr) => {
        $crate::RunLog::PhaseStarted {
            phase: $phase.to_string(),
            units: $units,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_phase_complete {
    ($phase:expr, $status:expr) => {
        $crate::RunLog::PhaseCompleted {
            phase: $phase.to_string(),
            status: $status.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_phase_skipped {
    ($phase:expr) => {
        $crate::RunLog::PhaseSkipped {
            phase: $phase.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_start {
    ($phase:expr, $unit:expr, $agent:expr, $desc:expr) => {
        $crate::RunLog::TaskStarted {
            phase: $phase.to_string(),
            unit: $unit.to_string(),
            agent: $agent.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_complete {
    ($unit:expr) => {
        $crate::RunLog::TaskCompleted {
            unit: $unit.to_string(),
            summary: None,
        }
        .emit();
    };
    ($unit:expr, $summary:expr) => {
        $crate::RunLog::TaskCompleted {
            unit: $unit.to_string(),
            summary: Some($summary.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_task_failed {
    ($unit:expr, $error:expr) => {
        $crate::RunLog::TaskFailed {
            unit: $unit.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_artifact_written {
    ($unit:expr, $path:expr) => {
        $crate::RunLog::ArtifactWritten {
            unit: $unit.to_string(),
            path: $path.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Colored human-readable output, complementing the structured RunLog events.
// ============================================================================

/// Logs an informational message.
///
/// # Example
/// ```
/// use modcrew_sdk::log_info;
/// log_info!("Loading task graph...");
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use modcrew_sdk::log_warning;
/// log_warning!("run history unavailable");
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}

/// Logs a debug message (callers gate this on their verbosity flag).
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[2m[DEBUG] {}\x1b[0m", format!($fmt, $($arg)*));
    };
}
