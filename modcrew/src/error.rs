//! Error taxonomy for orchestration runs.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors surfaced by the orchestrator.
///
/// A failed work unit is not an error in this sense: the phase runner
/// contains it as a [`TaskFailure`](crate::outcome::TaskFailure) record.
/// Only configuration and persistence problems abort a run.
#[derive(Debug, Error)]
pub enum OrchestrateError {
    /// Invalid phase name, unresolvable required input, unknown role or
    /// tool, or a missing path. Raised before any work unit executes.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The artifact store failed to durably record an outcome. Fatal
    /// regardless of --continue-on-error.
    #[error("persistence error writing {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl OrchestrateError {
    /// Shorthand for a [`OrchestrateError::Configuration`] with a formatted message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn persistence(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }
}
