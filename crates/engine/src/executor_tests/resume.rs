// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume: completed work is not re-executed; preconditions guard
//! against concurrent runs, runbook drift, and corrupt state.

use super::*;
use crate::ExecuteError;
use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_storage::{ExecutionState, RunStatus};
use serde_json::json;

const RUNBOOK: &str = r#"
name: audit
description: t
artifacts:
  src:
    source: {type: fs}
  out:
    inputs: src
    process: {type: classifier}
    output: true
"#;

fn registry() -> (ComponentRegistry, FakeConnectorFactory, FakeAnalyserFactory) {
    let connector = FakeConnectorFactory::standard("fs").with_content(json!([1]));
    let analyser = FakeAnalyserFactory::classifier("classifier");
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(connector.clone()));
    registry.register_analyser(Arc::new(analyser.clone()));
    (registry, connector, analyser)
}

/// Rewrite the stored run as if the process died after `src` persisted
/// but before `out` completed.
fn interrupt_after_src(store: &MemoryStore, run_id: &RunId) {
    let mut state = ExecutionState::new([id("src"), id("out")]);
    state.mark_completed(&id("src"));
    store.save_state(run_id, &state).unwrap();
    store.delete(run_id, "out").unwrap();

    let mut metadata = store.load_metadata(run_id).unwrap().unwrap();
    metadata.status = RunStatus::Failed;
    metadata.end_time = None;
    store.save_metadata(&metadata).unwrap();
}

#[tokio::test]
async fn resume_skips_completed_artifacts() {
    let (registry, connector, analyser) = registry();
    let plan = plan_with(&registry, RUNBOOK);
    let store = Arc::new(MemoryStore::new());

    let first = run(&registry, &plan, &store).await;
    assert_eq!(connector.extract_calls(), 1);
    interrupt_after_src(&store, &first.run_id);

    let resumed = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id.clone()))
        .await
        .unwrap();

    // src was not re-extracted; out ran again
    assert_eq!(connector.extract_calls(), 1);
    assert_eq!(analyser.calls().len(), 2);

    assert_eq!(resumed.run_id, first.run_id);
    assert!(resumed.is_success());
    assert_eq!(status_of(&resumed, "src"), ArtifactStatus::Completed);
    assert_eq!(status_of(&resumed, "out"), ArtifactStatus::Completed);
    assert!(store.exists(&resumed.run_id, "out").unwrap());
    assert_partition(&store, &resumed.run_id, &plan);
}

#[tokio::test]
async fn resume_matches_an_uninterrupted_run() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, RUNBOOK);

    let uninterrupted_store = Arc::new(MemoryStore::new());
    let uninterrupted = run(&registry, &plan, &uninterrupted_store).await;

    let store = Arc::new(MemoryStore::new());
    let first = run(&registry, &plan, &store).await;
    interrupt_after_src(&store, &first.run_id);
    let resumed = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id))
        .await
        .unwrap();

    let statuses = |result: &ExecutionResult| {
        result
            .artifacts
            .iter()
            .map(|(artifact, outcome)| (artifact.clone(), outcome.status))
            .collect::<Vec<_>>()
    };
    assert_eq!(statuses(&resumed), statuses(&uninterrupted));
    assert_eq!(resumed.status, uninterrupted.status);
}

#[tokio::test]
async fn resume_preserves_failed_and_skipped_sets() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("broken").failing("boom"),
    ));
    let ok = FakeConnectorFactory::standard("ok").with_content(json!([1]));
    registry.register_connector(Arc::new(ok.clone()));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  src:
    source: {type: broken}
  next:
    inputs: src
  independent:
    source: {type: ok}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let first = run(&registry, &plan, &store).await;
    assert_eq!(first.status, RunStatus::Failed);
    let extract_calls_after_first = ok.extract_calls();

    let resumed = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id))
        .await
        .unwrap();

    // Nothing re-runs: failed stays failed, dependents stay skipped
    assert_eq!(ok.extract_calls(), extract_calls_after_first);
    assert_eq!(status_of(&resumed, "src"), ArtifactStatus::Failed);
    assert_eq!(status_of(&resumed, "next"), ArtifactStatus::Skipped);
    assert_eq!(status_of(&resumed, "independent"), ArtifactStatus::Completed);
    assert_eq!(resumed.status, RunStatus::Failed);
}

#[tokio::test]
async fn resume_refuses_a_run_marked_running() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, RUNBOOK);
    let store = Arc::new(MemoryStore::new());

    let first = run(&registry, &plan, &store).await;
    let mut metadata = store.load_metadata(&first.run_id).unwrap().unwrap();
    metadata.status = RunStatus::Running;
    store.save_metadata(&metadata).unwrap();

    let err = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::RunActive(_)));
}

#[tokio::test]
async fn resume_refuses_a_changed_runbook() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, RUNBOOK);
    let store = Arc::new(MemoryStore::new());
    let first = run(&registry, &plan, &store).await;

    let edited = RUNBOOK.replace("type: fs", "type: fs, properties: {path: /other}");
    let changed_plan = plan_with(&registry, &edited);
    let err = executor(&registry, &changed_plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::RunbookChanged { .. }));
}

#[tokio::test]
async fn resume_refuses_an_unknown_run() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, RUNBOOK);
    let store = Arc::new(MemoryStore::new());

    let err = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(RunId::new("ghost")))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::RunNotFound(_)));
}

#[tokio::test]
async fn resume_refuses_inconsistent_state() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, RUNBOOK);
    let store = Arc::new(MemoryStore::new());
    let first = run(&registry, &plan, &store).await;

    // Drop "out" from the recorded sets entirely
    let state = ExecutionState::new([id("src")]);
    store.save_state(&first.run_id, &state).unwrap();
    let mut metadata = store.load_metadata(&first.run_id).unwrap().unwrap();
    metadata.status = RunStatus::Failed;
    store.save_metadata(&metadata).unwrap();

    let err = executor(&registry, &plan, &store)
        .execute(ExecuteOptions::resume_from(first.run_id))
        .await
        .unwrap_err();
    match err {
        ExecuteError::StateInvalid { message, .. } => assert!(message.contains("out")),
        other => panic!("expected StateInvalid, got {other}"),
    }
}
