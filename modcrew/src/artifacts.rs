//! Durable, checkpoint-per-task artifact store.
//!
//! Each executed work unit yields one JSON document in the output directory,
//! written immediately after the unit finishes so a crash mid-phase loses at
//! most the in-flight unit. Keys are unit ids; a second write for the same
//! key within a run is a logic error surfaced as a persistence failure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;
use tokio::fs;

use modcrew_sdk::log_artifact_written;

use crate::error::OrchestrateError;
use crate::graph::WorkUnit;
use crate::outcome::TaskOutcome;

/// Append-only record of per-task outcomes for one run.
///
/// The directory is created lazily on the first write, so a run that never
/// persists anything (a dry run) leaves the filesystem untouched.
pub struct ArtifactStore {
    dir: PathBuf,
    written: HashSet<String>,
    summary_written: bool,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: HashSet::new(),
            summary_written: false,
        }
    }

    /// Number of task records written this run (the summary not included).
    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// Keys recorded this run, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.written.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Persist one outcome under the unit's artifact name.
    ///
    /// Success payloads keep their task-specific schema under `payload`;
    /// failures are recorded as an `error` object so a rerun can tell the
    /// difference without parsing task schemas.
    pub async fn record(
        &mut self,
        unit: &WorkUnit,
        outcome: &TaskOutcome,
    ) -> Result<PathBuf, OrchestrateError> {
        let file_name = unit
            .output_file
            .clone()
            .unwrap_or_else(|| format!("{}.json", unit.id));
        let path = self.dir.join(&file_name);

        if !self.written.insert(unit.id.clone()) {
            return Err(OrchestrateError::persistence(
                &path,
                anyhow::anyhow!("unit '{}' was already recorded in this run", unit.id),
            ));
        }

        let document = match outcome {
            TaskOutcome::Completed(result) => json!({
                "unit": unit.id,
                "agent": unit.agent,
                "status": "succeeded",
                "recorded_at": Local::now().to_rfc3339(),
                "duration_ms": result.duration_ms,
                "payload": result.payload,
            }),
            TaskOutcome::Failed(failure) => json!({
                "unit": unit.id,
                "agent": unit.agent,
                "status": "failed",
                "recorded_at": Local::now().to_rfc3339(),
                "error": {
                    "kind": failure.kind,
                    "message": failure.message,
                    "recoverable": failure.recoverable,
                },
            }),
        };

        self.write_document(&path, &document).await?;
        log_artifact_written!(unit.id, path.display());
        Ok(path)
    }

    /// Persist the run-level summary document.
    pub async fn write_summary(
        &mut self,
        summary: &serde_json::Value,
    ) -> Result<PathBuf, OrchestrateError> {
        let path = self.dir.join("modernization_summary.json");
        if self.summary_written {
            return Err(OrchestrateError::persistence(
                &path,
                anyhow::anyhow!("run summary was already written"),
            ));
        }
        self.summary_written = true;
        self.write_document(&path, summary).await?;
        Ok(path)
    }

    async fn write_document(
        &self,
        path: &Path,
        document: &serde_json::Value,
    ) -> Result<(), OrchestrateError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| OrchestrateError::persistence(&self.dir, e))?;
        let body = serde_json::to_string_pretty(document)
            .map_err(|e| OrchestrateError::persistence(path, e))?;
        fs::write(path, body)
            .await
            .map_err(|e| OrchestrateError::persistence(path, e))?;
        Ok(())
    }
}
