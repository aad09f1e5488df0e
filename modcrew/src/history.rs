//! SQLite-backed history of orchestrator runs.
//!
//! One row per run: identity, target project, final status, timestamps, and
//! the serialized per-phase outcomes. This is bookkeeping across runs, not
//! part of the artifact contract; callers treat failures here as warnings.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::orchestrator::Run;

/// Persistent record of past runs.
pub struct RunHistory {
    conn: Connection,
}

/// Summary row returned by [`RunHistory::recent`].
#[derive(Debug, Clone)]
pub struct RunRow {
    pub id: String,
    pub project_path: String,
    pub status: Option<String>,
    pub dry_run: bool,
    pub started_at: String,
    pub finished_at: Option<String>,
}

impl RunHistory {
    /// Open (or create) the history database at `path`.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let history = Self { conn };
        history.initialize_schema()?;
        Ok(history)
    }

    /// In-memory database for tests.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let history = Self { conn };
        history.initialize_schema()?;
        Ok(history)
    }

    /// Open the database at its per-user data directory location.
    pub fn open_default() -> Result<Self> {
        Self::new(default_db_path())
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                project_path TEXT NOT NULL,
                status TEXT,
                dry_run INTEGER NOT NULL DEFAULT 0,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                phases TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// Insert the row for a run that just started.
    pub fn insert_run(
        &self,
        id: &Uuid,
        project_path: &str,
        dry_run: bool,
        started_at: DateTime<Local>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO runs (id, project_path, dry_run, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                project_path,
                dry_run as i32,
                started_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Attach the final status and phase outcomes to a run's row.
    pub fn finalize_run(&self, run: &Run) -> Result<()> {
        let phases = serde_json::to_string(&run.phases)?;
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, phases = ?3 WHERE id = ?4",
            params![
                run.status.name(),
                run.finished_at.to_rfc3339(),
                phases,
                run.id.to_string()
            ],
        )?;
        Ok(())
    }

    /// Most recent runs, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_path, status, dry_run, started_at, finished_at
             FROM runs ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RunRow {
                    id: row.get(0)?,
                    project_path: row.get(1)?,
                    status: row.get(2)?,
                    dry_run: row.get::<_, i32>(3)? != 0,
                    started_at: row.get(4)?,
                    finished_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn default_db_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "modcrew", "modcrew") {
        proj_dirs.data_dir().join("runs.db")
    } else {
        PathBuf::from(".modcrew-runs.db")
    }
}
