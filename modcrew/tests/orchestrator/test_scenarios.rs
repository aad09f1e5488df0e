//! End-to-end run scenarios with scripted executors.

use std::sync::Arc;

use serde_json::json;

use modcrew::cli::Args;
use modcrew::config::RunConfig;
use modcrew::error::OrchestrateError;
use modcrew::orchestrator::Orchestrator;
use modcrew::phase::{Phase, PhaseStatus, RunStatus};
use modcrew::registry::AgentRegistry;

use super::common::{
    cleanup_temp_dir, create_temp_dir, dir_entries, test_config, uniform_registry,
    ScriptedExecutor, ROLES,
};
use clap::Parser;

fn phase_status(run: &modcrew::orchestrator::Run, phase: Phase) -> PhaseStatus {
    run.phases
        .iter()
        .find(|outcome| outcome.phase == phase)
        .map(|outcome| outcome.status)
        .unwrap()
}

#[tokio::test]
async fn test_dry_run_analysis_writes_nothing() {
    let root = create_temp_dir("dry_run_analysis");
    let mut config = test_config(&root);
    config.phases = vec![Phase::Analysis];
    config.dry_run = true;
    let output_dir = config.output_dir.clone();

    // No executors at all: a dry run must not need any.
    let registry = AgentRegistry::from_embedded(None).unwrap();
    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(run.status.exit_code(), 0);
    assert_eq!(phase_status(&run, Phase::Analysis), PhaseStatus::Succeeded);
    assert_eq!(phase_status(&run, Phase::Modernization), PhaseStatus::Skipped);
    assert_eq!(phase_status(&run, Phase::Qa), PhaseStatus::Skipped);
    assert_eq!(phase_status(&run, Phase::Documentation), PhaseStatus::Skipped);

    let analysis = run
        .phases
        .iter()
        .find(|outcome| outcome.phase == Phase::Analysis)
        .unwrap();
    assert_eq!(analysis.succeeded, 2);
    assert_eq!(analysis.failed, 0);

    // Zero artifacts: the output directory was never created.
    assert!(!output_dir.exists());

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_dry_run_never_invokes_executors() {
    let root = create_temp_dir("dry_run_counts");
    let mut config = test_config(&root);
    config.dry_run = true;

    let executor = ScriptedExecutor::ok(json!({"ok": true}));
    let registry = uniform_registry(executor.clone());
    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(executor.call_count(), 0);

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_failure_without_continue_aborts_run() {
    let root = create_temp_dir("abort_run");
    let mut config = test_config(&root);
    config.phases = vec![Phase::Analysis, Phase::Modernization];
    let output_dir = config.output_dir.clone();

    let analyst = ScriptedExecutor::ok(json!({"files": 42}));
    let auditor = ScriptedExecutor::failing("capability service returned 503");
    let downstream = ScriptedExecutor::ok(json!({"ok": true}));

    let mut registry = AgentRegistry::empty();
    registry.insert("code_analyst", analyst.clone());
    registry.insert("dependency_manager", auditor.clone());
    registry.insert("modernization_specialist", downstream.clone());
    registry.insert("build_config_specialist", downstream.clone());

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_ne!(run.status.exit_code(), 0);
    assert_eq!(phase_status(&run, Phase::Analysis), PhaseStatus::Failed);
    assert_eq!(phase_status(&run, Phase::Modernization), PhaseStatus::Skipped);

    // The second analysis unit failed; nothing downstream was dispatched.
    assert_eq!(analyst.call_count(), 1);
    assert_eq!(auditor.call_count(), 1);
    assert_eq!(downstream.call_count(), 0);

    // Both attempted units were checkpointed, and the partial run summary
    // was still written.
    assert_eq!(
        dir_entries(&output_dir),
        vec![
            "analysis_report.json".to_string(),
            "dependency_report.json".to_string(),
            "modernization_summary.json".to_string(),
        ]
    );

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_qa_continue_on_error_partial_failure() {
    let root = create_temp_dir("qa_partial");
    let mut config = test_config(&root);
    config.phases = vec![Phase::Qa];
    config.continue_on_error = true;
    let output_dir = config.output_dir.clone();

    let tester = ScriptedExecutor::ok(json!({"suites": 3}));
    let auditor = ScriptedExecutor::failing("capability service returned 503");
    let optimizer = ScriptedExecutor::ok(json!({"hot_paths": 2}));

    let mut registry = AgentRegistry::empty();
    registry.insert("testing_engineer", tester.clone());
    registry.insert("security_auditor", auditor.clone());
    registry.insert("performance_optimizer", optimizer.clone());

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::PartiallyFailed);
    assert_eq!(run.status.exit_code(), 0);
    assert_eq!(phase_status(&run, Phase::Qa), PhaseStatus::PartiallyFailed);

    let qa = run
        .phases
        .iter()
        .find(|outcome| outcome.phase == Phase::Qa)
        .unwrap();
    assert_eq!(qa.succeeded, 2);
    assert_eq!(qa.failed, 1);
    assert_eq!(qa.failures.len(), 1);
    assert_eq!(qa.failures[0].unit, "security_audit");

    // Three task records (one failure, two results) plus the summary.
    assert_eq!(
        dir_entries(&output_dir),
        vec![
            "modernization_summary.json".to_string(),
            "performance_report.json".to_string(),
            "security_audit_report.json".to_string(),
            "test_suite_report.json".to_string(),
        ]
    );

    let audit_body =
        std::fs::read_to_string(output_dir.join("security_audit_report.json")).unwrap();
    let audit: serde_json::Value = serde_json::from_str(&audit_body).unwrap();
    assert_eq!(audit["status"], "failed");
    assert_eq!(audit["error"]["recoverable"], true);

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_bogus_phase_name_fails_before_execution() {
    let args = Args::try_parse_from([
        "modcrew",
        "--project-path",
        "/srv/app",
        "--watchdog-path",
        "/srv/app/watchdog",
        "--phases",
        "bogus",
    ])
    .unwrap();

    let err = RunConfig::try_from(args).unwrap_err();
    assert!(matches!(err, OrchestrateError::Configuration(_)));
    assert!(err.to_string().contains("unknown phase 'bogus'"));
}

#[tokio::test]
async fn test_continue_on_error_attempts_every_unit_once() {
    let root = create_temp_dir("attempt_all");
    let mut config = test_config(&root);
    config.continue_on_error = true;

    let steady = ScriptedExecutor::ok(json!({"ok": true}));
    let flaky = ScriptedExecutor::failing("capability service returned 503");

    let mut registry = AgentRegistry::empty();
    for role in ROLES {
        registry.insert(role, steady.clone());
    }
    registry.insert("dependency_manager", flaky.clone());

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::PartiallyFailed);
    // Eight units, each attempted exactly once despite the early failure.
    assert_eq!(steady.call_count() + flaky.call_count(), 8);
    assert_eq!(flaky.call_count(), 1);

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_abort_halts_all_later_phases() {
    let root = create_temp_dir("abort_everything");
    let config = test_config(&root);

    let flaky = ScriptedExecutor::failing("capability service returned 503");
    let steady = ScriptedExecutor::ok(json!({"ok": true}));

    let mut registry = AgentRegistry::empty();
    for role in ROLES {
        registry.insert(role, steady.clone());
    }
    registry.insert("code_analyst", flaky.clone());

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(flaky.call_count(), 1);
    assert_eq!(steady.call_count(), 0);
    for phase in [Phase::Modernization, Phase::Qa, Phase::Documentation] {
        assert_eq!(phase_status(&run, phase), PhaseStatus::Skipped);
    }

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_required_input_missing_is_rejected_before_execution() {
    let root = create_temp_dir("missing_required");
    let mut config = test_config(&root);
    // code_modernization requires the analysis phase's output.
    config.phases = vec![Phase::Modernization];
    let output_dir = config.output_dir.clone();

    let executor = ScriptedExecutor::ok(json!({"ok": true}));
    let registry = uniform_registry(executor.clone());

    let err = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrateError::Configuration(_)));
    assert_eq!(executor.call_count(), 0);
    assert!(!output_dir.exists());

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_invalid_project_path_is_configuration_error() {
    let root = create_temp_dir("bad_path");
    let mut config = test_config(&root);
    config.project_path = root.join("does_not_exist");

    let registry = uniform_registry(ScriptedExecutor::ok(json!({"ok": true})));
    let err = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, OrchestrateError::Configuration(_)));
    assert!(err.to_string().contains("not a directory"));

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_requested_order_does_not_change_execution_order() {
    let root = create_temp_dir("canonical_order");
    let mut config = test_config(&root);
    // Reversed on purpose.
    config.phases = vec![Phase::Documentation, Phase::Qa, Phase::Modernization, Phase::Analysis];

    let executor = ScriptedExecutor::ok(json!({"ok": true}));
    let registry = uniform_registry(executor.clone());

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(executor.call_count(), 8);
    let order: Vec<Phase> = run.phases.iter().map(|outcome| outcome.phase).collect();
    assert_eq!(order, Phase::ALL.to_vec());
    for outcome in &run.phases {
        assert_eq!(outcome.status, PhaseStatus::Succeeded);
    }

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_rerun_produces_identical_artifact_key_set() {
    let root = create_temp_dir("idempotent");

    let first = {
        let mut config = test_config(&root);
        config.phases = vec![Phase::Analysis, Phase::Qa];
        let registry = uniform_registry(ScriptedExecutor::ok(json!({"pass": 1})));
        let run = Orchestrator::new(config.clone(), registry)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        dir_entries(&config.output_dir)
    };

    let second = {
        let mut config = test_config(&root);
        config.phases = vec![Phase::Analysis, Phase::Qa];
        let registry = uniform_registry(ScriptedExecutor::ok(json!({"pass": 2})));
        let run = Orchestrator::new(config.clone(), registry)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        dir_entries(&config.output_dir)
    };

    assert_eq!(first, second);

    cleanup_temp_dir(&root);
}
