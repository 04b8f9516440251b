// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: source -> analyser happy path.

use crate::prelude::*;
use dm_engine::{ArtifactStatus, ExecuteOptions};
use dm_storage::{ArtifactStore, RunStateStore, RunStatus};

const RUNBOOK: &str = r#"
name: audit
description: Locate personal data
artifacts:
  src:
    source:
      type: fs
      properties: {path: /data}
  out:
    inputs: src
    process: {type: classifier}
    output: true
"#;

#[tokio::test]
async fn source_then_analyser() {
    let project = Project::new();
    project.write("audit.yaml", RUNBOOK);
    let registry = spec_registry();
    let plan = project.plan_ok(&registry, "audit.yaml");
    let store = project.store();

    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(status_of(&result, "src"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "out"), ArtifactStatus::Completed);
    assert!(result.failed().is_empty());
    assert!(result.skipped().is_empty());

    // Store contains messages at both ids
    assert!(store.exists(&result.run_id, "src").unwrap());
    assert!(store.exists(&result.run_id, "out").unwrap());

    // Terminal sets partition the plan's ids
    let state = store.load_state(&result.run_id).unwrap().unwrap();
    state.validate_against(&plan.ids()).unwrap();
}

#[tokio::test]
async fn outputs_export_by_id() {
    let project = Project::new();
    project.write("audit.yaml", RUNBOOK);
    let registry = spec_registry();
    let plan = project.plan_ok(&registry, "audit.yaml");
    let store = project.store();

    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    let outputs = result.export_outputs(plan.as_ref(), store.as_ref()).unwrap();

    assert_eq!(outputs.len(), 1);
    assert!(outputs.contains_key("out"));
}

#[tokio::test]
async fn repeated_runs_are_isolated_by_run_id() {
    let project = Project::new();
    project.write("audit.yaml", RUNBOOK);
    let registry = spec_registry();
    let plan = project.plan_ok(&registry, "audit.yaml");
    let store = project.store();

    let first = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    let second = execute(&registry, &plan, &store, ExecuteOptions::new()).await;

    assert_ne!(first.run_id, second.run_id);
    assert!(store.exists(&first.run_id, "out").unwrap());
    assert!(store.exists(&second.run_id, "out").unwrap());

    // Clearing one run leaves the other intact
    store.clear(&first.run_id).unwrap();
    assert!(!store.exists(&first.run_id, "out").unwrap());
    assert!(store.exists(&second.run_id, "out").unwrap());
}
