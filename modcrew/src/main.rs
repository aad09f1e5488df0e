//! modcrew binary entry point.

use std::sync::Arc;

use clap::Parser;

use modcrew::cli::Args;
use modcrew::config::RunConfig;
use modcrew::error::OrchestrateError;
use modcrew::executor::{CapabilityClient, CapabilityConfig};
use modcrew::history::RunHistory;
use modcrew::orchestrator::{Orchestrator, Run};
use modcrew::registry::AgentRegistry;
use modcrew_sdk::log_warning;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    match execute(args).await {
        Ok(run) => std::process::exit(run.status.exit_code()),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

async fn execute(args: Args) -> Result<Run, OrchestrateError> {
    let config = RunConfig::try_from(args)?;

    // Dry runs never call the capability service, so a missing endpoint only
    // matters for real execution; the registry reports it before any unit
    // runs.
    let client = if config.dry_run {
        None
    } else {
        CapabilityConfig::from_env()
            .ok()
            .map(|capability| Arc::new(CapabilityClient::new(capability)))
    };

    let registry = AgentRegistry::from_embedded(client)?;

    let history = match RunHistory::open_default() {
        Ok(history) => Some(history),
        Err(err) => {
            log_warning!("run history unavailable: {:#}", err);
            None
        }
    };

    let mut orchestrator = Orchestrator::new(config, registry)?;
    if let Some(history) = history {
        orchestrator = orchestrator.with_history(history);
    }
    orchestrator.run().await
}
