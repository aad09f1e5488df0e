//! Agent role configuration and executor resolution.
//!
//! The registry is read-only configuration parsed from `config/agents.yaml`:
//! it maps role ids to capability descriptors and hands out the executor
//! bound to each role. It performs no orchestration logic.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::OrchestrateError;
use crate::executor::{CapabilityClient, Executor, RoleExecutor};
use crate::utils::closest_match;

const CANONICAL_AGENTS: &str = include_str!("../config/agents.yaml");

/// Tool names an agent configuration may reference. The core never
/// interprets these; they are forwarded to the reasoning service as context.
pub const TOOL_CATALOG: [&str; 8] = [
    "Node Code Analyzer",
    "Dependency Analyzer",
    "Watchdog Service Analyzer",
    "Security Scanner",
    "Test Generator",
    "Node Version Migrator",
    "ESM Migration Tool",
    "Native Module Migrator",
];

fn default_max_iterations() -> u32 {
    3
}

/// Capability descriptor for one agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Display name, e.g. "Senior Node.js Code Analyst".
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
    /// Budget for re-prompting on malformed output.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub allow_delegation: bool,
}

/// Role id → executor mapping.
pub struct AgentRegistry {
    specs: HashMap<String, AgentSpec>,
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl AgentRegistry {
    /// Load the embedded role configuration. With a client, every role is
    /// bound to a [`RoleExecutor`]; without one (dry runs), roles are known
    /// but not executable.
    pub fn from_embedded(client: Option<Arc<CapabilityClient>>) -> Result<Self, OrchestrateError> {
        Self::from_yaml(CANONICAL_AGENTS, client)
    }

    pub fn from_yaml(
        source: &str,
        client: Option<Arc<CapabilityClient>>,
    ) -> Result<Self, OrchestrateError> {
        let specs: HashMap<String, AgentSpec> = serde_yaml::from_str(source)
            .map_err(|e| OrchestrateError::config(format!("invalid agent configuration: {}", e)))?;
        validate_tools(&specs)?;

        let mut executors: HashMap<String, Arc<dyn Executor>> = HashMap::new();
        if let Some(client) = client {
            for (name, spec) in &specs {
                executors.insert(
                    name.clone(),
                    Arc::new(RoleExecutor::new(spec.clone(), client.clone())),
                );
            }
        }

        Ok(Self { specs, executors })
    }

    /// Registry with no configured roles; used with [`AgentRegistry::insert`].
    pub fn empty() -> Self {
        Self {
            specs: HashMap::new(),
            executors: HashMap::new(),
        }
    }

    /// Bind a role directly to an executor, overriding any configured one.
    pub fn insert(&mut self, role: impl Into<String>, executor: Arc<dyn Executor>) {
        self.executors.insert(role.into(), executor);
    }

    /// Whether the role is known, executable or not.
    pub fn contains(&self, role: &str) -> bool {
        self.specs.contains_key(role) || self.executors.contains_key(role)
    }

    /// Check that a role exists, suggesting the closest known role on a miss.
    pub fn ensure_role(&self, role: &str) -> Result<(), OrchestrateError> {
        if self.contains(role) {
            return Ok(());
        }
        let known: Vec<&str> = self
            .specs
            .keys()
            .chain(self.executors.keys())
            .map(String::as_str)
            .collect();
        let message = match closest_match(known, role) {
            Some(suggestion) => format!("unknown agent role '{}' (closest: '{}')", role, suggestion),
            None => format!("unknown agent role '{}'", role),
        };
        Err(OrchestrateError::config(message))
    }

    /// Resolve a role to its executor.
    pub fn resolve(&self, role: &str) -> Result<Arc<dyn Executor>, OrchestrateError> {
        if let Some(executor) = self.executors.get(role) {
            return Ok(executor.clone());
        }
        self.ensure_role(role)?;
        Err(OrchestrateError::config(format!(
            "role '{}' has no executor: capability endpoint is not configured (set MODCREW_ENDPOINT)",
            role
        )))
    }

    pub fn spec(&self, role: &str) -> Option<&AgentSpec> {
        self.specs.get(role)
    }
}

/// Reject configurations that reference tools missing from the catalog,
/// naming the closest catalog entry for likely typos.
fn validate_tools(specs: &HashMap<String, AgentSpec>) -> Result<(), OrchestrateError> {
    for (name, spec) in specs {
        for tool in &spec.tools {
            if TOOL_CATALOG.contains(&tool.as_str()) {
                continue;
            }
            let message = match closest_match(TOOL_CATALOG, tool) {
                Some(suggestion) => format!(
                    "agent '{}' lists unregistered tool '{}' (did you mean '{}'?)",
                    name, tool, suggestion
                ),
                None => format!("agent '{}' lists unregistered tool '{}'", name, tool),
            };
            return Err(OrchestrateError::config(message));
        }
    }
    Ok(())
}
