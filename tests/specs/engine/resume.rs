// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: interrupt after the source persists, resume, and converge on
//! the same final state as an uninterrupted run.

use crate::prelude::*;
use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_core::{ArtifactId, ComponentRegistry, RunId};
use dm_engine::{ArtifactStatus, ExecuteOptions, ExecutionResult};
use dm_storage::{ArtifactStore, ExecutionState, FsArtifactStore, RunStateStore, RunStatus};
use serde_json::json;
use std::sync::Arc;

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

fn counting_registry() -> (ComponentRegistry, FakeConnectorFactory, FakeAnalyserFactory) {
    let connector = FakeConnectorFactory::standard("fs").with_content(json!([1]));
    let analyser = FakeAnalyserFactory::classifier("classifier");
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(connector.clone()));
    registry.register_analyser(Arc::new(analyser.clone()));
    (registry, connector, analyser)
}

/// Rewrite the persisted run as if the process died after `src` was
/// saved but before `out` completed: `src` completed, `out` not started,
/// no stored `out` message, run no longer marked running.
fn interrupt_after_src(store: &FsArtifactStore, run_id: &RunId) {
    let mut state = ExecutionState::new([ArtifactId::new("src"), ArtifactId::new("out")]);
    state.mark_completed(&ArtifactId::new("src"));
    store.save_state(run_id, &state).unwrap();
    store.delete(run_id, "out").unwrap();

    let mut metadata = store.load_metadata(run_id).unwrap().unwrap();
    metadata.status = RunStatus::Failed;
    metadata.end_time = None;
    store.save_metadata(&metadata).unwrap();
}

#[tokio::test]
async fn resume_runs_only_the_unfinished_artifact() {
    let project = Project::new();
    project.write("audit.yaml", RUNBOOK);
    let (registry, connector, analyser) = counting_registry();
    let plan = project.plan_ok(&registry, "audit.yaml");
    let store = project.store();

    let first = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    assert_eq!(connector.extract_calls(), 1);
    interrupt_after_src(&store, &first.run_id);

    let resumed = execute(
        &registry,
        &plan,
        &store,
        ExecuteOptions::resume_from(first.run_id.clone()),
    )
    .await;

    // src is not re-executed; out is
    assert_eq!(connector.extract_calls(), 1);
    assert_eq!(analyser.calls().len(), 2);
    assert_eq!(resumed.run_id, first.run_id);
    assert!(resumed.is_success());
    assert_eq!(status_of(&resumed, "src"), ArtifactStatus::Completed);
    assert_eq!(status_of(&resumed, "out"), ArtifactStatus::Completed);
}

#[tokio::test]
async fn resumed_final_state_matches_scenario_a() {
    let project = Project::new();
    project.write("audit.yaml", RUNBOOK);
    let (registry, _, _) = counting_registry();
    let plan = project.plan_ok(&registry, "audit.yaml");
    let store = project.store();

    let baseline = execute(&registry, &plan, &store, ExecuteOptions::new()).await;

    let interrupted = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    interrupt_after_src(&store, &interrupted.run_id);
    let resumed = execute(
        &registry,
        &plan,
        &store,
        ExecuteOptions::resume_from(interrupted.run_id),
    )
    .await;

    let outcome = |result: &ExecutionResult| {
        (
            result.status,
            result
                .artifacts
                .iter()
                .map(|(artifact, record)| (artifact.clone(), record.status))
                .collect::<Vec<_>>(),
        )
    };
    similar_asserts::assert_eq!(outcome(&resumed), outcome(&baseline));

    // Both runs left equivalent stored artifacts
    for key in ["src", "out"] {
        let a = store.get(&baseline.run_id, key).unwrap();
        let b = store.get(&resumed.run_id, key).unwrap();
        assert_eq!(a.content, b.content);
        assert_eq!(a.schema, b.schema);
    }
}
