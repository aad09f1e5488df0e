//! Capability executors for agent roles.
//!
//! The reasoning service behind each agent is opaque to the orchestration
//! core: an [`Executor`] takes a work unit plus its resolved inputs and
//! either returns a structured payload or fails. [`RoleExecutor`] is the
//! production implementation, driving the service over HTTP and retrying
//! malformed output within the role's iteration budget.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::graph::WorkUnit;
use crate::registry::AgentSpec;

/// Inputs available to one work unit execution.
#[derive(Debug, Clone, Default)]
pub struct InputSet {
    /// Target codebase root.
    pub project_path: PathBuf,
    /// Subsystem-of-interest path, forwarded as task context.
    pub watchdog_path: PathBuf,
    /// Upstream payloads keyed by producing unit id. Failed or absent
    /// producers simply have no entry here.
    pub upstream: HashMap<String, Value>,
}

/// The capability that performs a work unit's actual work.
///
/// Implementations must be safe for repeated invocation: one executor serves
/// every unit that shares its role, and holds no state between calls.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, unit: &WorkUnit, inputs: &InputSet) -> Result<Value>;
}

/// Connection settings for the external reasoning service.
#[derive(Debug, Clone)]
pub struct CapabilityConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl CapabilityConfig {
    /// Read `MODCREW_ENDPOINT`, `MODCREW_MODEL`, and `MODCREW_API_KEY` from
    /// the environment (`main` applies dotenv before this runs).
    pub fn from_env() -> Result<Self> {
        let endpoint =
            std::env::var("MODCREW_ENDPOINT").context("MODCREW_ENDPOINT is not set")?;
        let model = std::env::var("MODCREW_MODEL").unwrap_or_else(|_| "default".to_string());
        let api_key = std::env::var("MODCREW_API_KEY").ok();
        Ok(Self {
            endpoint,
            model,
            api_key,
        })
    }
}

/// JSON client for the reasoning service.
pub struct CapabilityClient {
    http: reqwest::Client,
    config: CapabilityConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    output: String,
}

impl CapabilityClient {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// One round-trip to the reasoning service.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let mut request = self.http.post(&self.config.endpoint).json(&json!({
            "model": self.config.model,
            "system": system,
            "prompt": prompt,
        }));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("capability request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("capability service returned {}", status);
        }
        let completion: CompletionResponse = response
            .json()
            .await
            .context("capability response was not valid JSON")?;
        Ok(completion.output)
    }
}

/// Executor for one configured role.
///
/// Assembles the system prompt from the role descriptor and the task prompt
/// from the work unit and its inputs, then asks the service for a JSON
/// document, re-prompting on malformed output until the role's iteration
/// budget is spent.
pub struct RoleExecutor {
    spec: AgentSpec,
    client: Arc<CapabilityClient>,
}

impl RoleExecutor {
    pub fn new(spec: AgentSpec, client: Arc<CapabilityClient>) -> Self {
        Self { spec, client }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}.\n\nGoal: {}\n\n{}",
            self.spec.role.trim(),
            self.spec.goal.trim(),
            self.spec.backstory.trim()
        );
        if !self.spec.tools.is_empty() {
            prompt.push_str(&format!(
                "\n\nAvailable tools: {}.",
                self.spec.tools.join(", ")
            ));
        }
        if self.spec.allow_delegation {
            prompt.push_str("\n\nYou may delegate subtasks to other specialists when needed.");
        }
        prompt
    }

    fn task_prompt(&self, unit: &WorkUnit, inputs: &InputSet) -> String {
        let mut prompt = format!(
            "# Task: {}\n\nProject root: {}\nWatchdog subsystem: {}\n\n{}",
            unit.id,
            inputs.project_path.display(),
            inputs.watchdog_path.display(),
            unit.description.trim()
        );

        if !inputs.upstream.is_empty() {
            prompt.push_str("\n\n# Upstream results\n");
            let mut keys: Vec<&String> = inputs.upstream.keys().collect();
            keys.sort();
            for key in keys {
                let rendered =
                    serde_json::to_string_pretty(&inputs.upstream[key]).unwrap_or_default();
                prompt.push_str(&format!("\n## {}\n{}\n", key, rendered));
            }
        }

        prompt.push_str(&format!(
            "\n\nRespond with a single JSON document of kind '{}'.",
            unit.expected_output
        ));
        prompt
    }
}

#[async_trait]
impl Executor for RoleExecutor {
    async fn execute(&self, unit: &WorkUnit, inputs: &InputSet) -> Result<Value> {
        let system = self.system_prompt();
        let base_prompt = self.task_prompt(unit, inputs);
        let budget = self.spec.max_iterations.max(1);

        let mut prompt = base_prompt.clone();
        let mut last_error = String::new();
        for _ in 0..budget {
            let text = self.client.complete(&system, &prompt).await?;
            match extract_json(&text) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = err.to_string();
                    prompt = format!(
                        "{}\n\nYour previous reply was not usable ({}). \
                         Reply again with only the JSON document.",
                        base_prompt, last_error
                    );
                }
            }
        }
        bail!(
            "agent '{}' produced no valid '{}' document in {} iterations: {}",
            self.spec.role,
            unit.expected_output,
            budget,
            last_error
        )
    }
}

/// Extract the first JSON document from model output, tolerating code fences
/// and surrounding prose.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end]) {
                return Ok(value);
            }
        }
    }
    bail!("no JSON document found in agent output")
}
