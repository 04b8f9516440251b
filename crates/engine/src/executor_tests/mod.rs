// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{ArtifactStatus, DagExecutor, ExecuteOptions, ExecutionResult};
use dm_core::{ArtifactId, ComponentRegistry, RunId, ServiceContainer};
use dm_planner::{ExecutionPlan, Planner};
use dm_runbook::parse_runbook_str;
use dm_storage::{ArtifactStore, MemoryStore, RunStateStore};
use std::path::Path;
use std::sync::Arc;

mod concurrency;
mod failure;
mod happy;
mod resume;
mod reuse;

pub(crate) fn plan_with(registry: &ComponentRegistry, yaml: &str) -> Arc<ExecutionPlan> {
    let runbook = parse_runbook_str(yaml).expect("runbook parses");
    Arc::new(
        Planner::new(registry)
            .plan_parsed(runbook, Path::new("audit.yaml"))
            .expect("plan compiles"),
    )
}

pub(crate) fn executor(
    registry: &ComponentRegistry,
    plan: &Arc<ExecutionPlan>,
    store: &Arc<MemoryStore>,
) -> DagExecutor<MemoryStore> {
    DagExecutor::new(
        Arc::clone(plan),
        Arc::new(registry.clone()),
        Arc::new(ServiceContainer::new()),
        Arc::clone(store),
    )
}

pub(crate) async fn run(
    registry: &ComponentRegistry,
    plan: &Arc<ExecutionPlan>,
    store: &Arc<MemoryStore>,
) -> ExecutionResult {
    executor(registry, plan, store)
        .execute(ExecuteOptions::new())
        .await
        .expect("run executes")
}

pub(crate) fn id(s: &str) -> ArtifactId {
    ArtifactId::new(s)
}

pub(crate) fn status_of(result: &ExecutionResult, artifact: &str) -> ArtifactStatus {
    result.artifacts[&id(artifact)].status
}

/// Invariant 2: terminal sets partition the plan's ids.
pub(crate) fn assert_partition(
    store: &MemoryStore,
    run_id: &RunId,
    plan: &ExecutionPlan,
) {
    let state = store
        .load_state(run_id)
        .expect("state loads")
        .expect("state exists");
    state
        .validate_against(&plan.ids())
        .expect("state partitions plan ids");
}

/// Invariant 3: successful artifacts are stored, failed/skipped are not.
pub(crate) fn assert_store_matches(
    store: &MemoryStore,
    result: &ExecutionResult,
) {
    for (artifact, outcome) in &result.artifacts {
        let exists = store.exists(&result.run_id, artifact.as_str()).expect("exists");
        match outcome.status {
            ArtifactStatus::Completed => assert!(exists, "{artifact} should be stored"),
            _ => assert!(!exists, "{artifact} should not be stored"),
        }
    }
}

#[test]
fn options_default_to_fresh_run() {
    let options = ExecuteOptions::new();
    assert!(options.run_id.is_none());
    assert!(options.resume_from.is_none());

    let options = ExecuteOptions::resume_from(RunId::new("r1"));
    assert_eq!(options.resume_from.as_ref().map(|r| r.as_str()), Some("r1"));
}
