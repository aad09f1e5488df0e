//! Run record, summary artifact, and history bookkeeping.

use serde_json::json;

use modcrew::history::RunHistory;
use modcrew::orchestrator::Orchestrator;
use modcrew::phase::{Phase, RunStatus};
use modcrew::registry::AgentRegistry;

use super::common::{
    cleanup_temp_dir, create_temp_dir, test_config, uniform_registry, ScriptedExecutor,
};

#[tokio::test]
async fn test_summary_artifact_reflects_run_record() {
    let root = create_temp_dir("summary_record");
    let config = test_config(&root);
    let output_dir = config.output_dir.clone();

    let registry = uniform_registry(ScriptedExecutor::ok(json!({"ok": true})));
    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    let body = std::fs::read_to_string(output_dir.join("modernization_summary.json")).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(summary["id"], run.id.to_string());
    assert_eq!(summary["status"], "succeeded");
    assert_eq!(summary["dry_run"], false);
    assert_eq!(summary["phases"].as_array().unwrap().len(), 4);
    assert_eq!(summary["phases"][0]["phase"], "analysis");
    assert_eq!(summary["phases"][0]["status"], "succeeded");

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_task_artifact_wraps_payload() {
    let root = create_temp_dir("artifact_payload");
    let mut config = test_config(&root);
    config.phases = vec![Phase::Analysis];
    let output_dir = config.output_dir.clone();

    let registry = uniform_registry(ScriptedExecutor::ok(json!({"files": 42})));
    Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    let body = std::fs::read_to_string(output_dir.join("analysis_report.json")).unwrap();
    let document: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(document["unit"], "code_analysis");
    assert_eq!(document["agent"], "code_analyst");
    assert_eq!(document["status"], "succeeded");
    assert_eq!(document["payload"]["files"], 42);

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_history_records_one_row_per_run() {
    let root = create_temp_dir("history_rows");
    let db_path = root.join("runs.db");

    for pass in 0..2 {
        let mut config = test_config(&root);
        config.phases = vec![Phase::Analysis];
        let registry = uniform_registry(ScriptedExecutor::ok(json!({"pass": pass})));
        let history = RunHistory::new(db_path.clone()).unwrap();

        let run = Orchestrator::new(config, registry)
            .unwrap()
            .with_history(history)
            .run()
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
    }

    let history = RunHistory::new(db_path).unwrap();
    let rows = history.recent(10).unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row.status.as_deref(), Some("succeeded"));
        assert!(row.finished_at.is_some());
        assert!(!row.dry_run);
    }

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_history_records_failed_status() {
    let root = create_temp_dir("history_failed");
    let db_path = root.join("runs.db");

    let mut config = test_config(&root);
    config.phases = vec![Phase::Analysis];

    let mut registry = AgentRegistry::empty();
    registry.insert("code_analyst", ScriptedExecutor::failing("boom"));
    registry.insert(
        "dependency_manager",
        ScriptedExecutor::ok(json!({"ok": true})),
    );

    let run = Orchestrator::new(config, registry)
        .unwrap()
        .with_history(RunHistory::new(db_path.clone()).unwrap())
        .run()
        .await
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);

    let history = RunHistory::new(db_path).unwrap();
    let rows = history.recent(1).unwrap();
    assert_eq!(rows[0].status.as_deref(), Some("failed"));

    cleanup_temp_dir(&root);
}

#[tokio::test]
async fn test_run_record_covers_all_canonical_phases() {
    let root = create_temp_dir("record_phases");
    let mut config = test_config(&root);
    config.phases = vec![Phase::Qa];
    config.dry_run = true;

    let registry = AgentRegistry::from_embedded(None).unwrap();
    let run = Orchestrator::new(config, registry)
        .unwrap()
        .run()
        .await
        .unwrap();

    let phases: Vec<Phase> = run.phases.iter().map(|outcome| outcome.phase).collect();
    assert_eq!(phases, Phase::ALL.to_vec());

    cleanup_temp_dir(&root);
}
