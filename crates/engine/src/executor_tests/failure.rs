// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure containment: per-artifact failure, dependent skip, optional
//! semantics, unavailability.

use super::*;
use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_storage::RunStatus;
use serde_json::json;

#[tokio::test]
async fn failed_source_skips_dependents_and_spares_independents() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("broken").failing("connection refused"),
    ));
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("ok").with_content(json!([1])),
    ));

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
    let result = run(&registry, &plan, &store).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.reason.as_deref(), Some("artifact failures"));
    assert_eq!(status_of(&result, "independent"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "src"), ArtifactStatus::Failed);
    assert_eq!(status_of(&result, "next"), ArtifactStatus::Skipped);

    let error = result.artifacts[&id("src")].error.as_deref().unwrap();
    assert!(error.contains("connection refused"));
    assert!(result.artifacts[&id("next")].error.is_none());

    assert_store_matches(&store, &result);
    assert_partition(&store, &result.run_id, &plan);
}

#[tokio::test]
async fn failure_skips_transitive_dependents() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("broken").failing("boom"),
    ));
    registry.register_analyser(Arc::new(FakeAnalyserFactory::classifier("classifier")));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  top:
    source: {type: broken}
  mid:
    inputs: top
  bottom:
    inputs: mid
    process: {type: classifier}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "top"), ArtifactStatus::Failed);
    assert_eq!(status_of(&result, "mid"), ArtifactStatus::Skipped);
    assert_eq!(status_of(&result, "bottom"), ArtifactStatus::Skipped);
}

#[tokio::test]
async fn diamond_bottom_is_skipped_when_one_branch_fails() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("ok").with_content(json!([1])),
    ));
    registry.register_analyser(Arc::new(
        FakeAnalyserFactory::classifier("flaky").failing("model overloaded"),
    ));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  top:
    source: {type: ok}
  left:
    inputs: top
  right:
    inputs: top
    process: {type: flaky}
    output_schema: standard_input/1.0.0
  bottom:
    inputs: [left, right]
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "left"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "right"), ArtifactStatus::Failed);
    assert_eq!(status_of(&result, "bottom"), ArtifactStatus::Skipped);
    assert_partition(&store, &result.run_id, &plan);
}

#[tokio::test]
async fn optional_failure_completes_the_run_with_warnings() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("broken").failing("boom"),
    ));
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("ok").with_content(json!([1])),
    ));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  enrichment:
    source: {type: broken}
    optional: true
  dependent:
    inputs: enrichment
  main:
    source: {type: ok}
    output: true
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    // Policy: only-optional failures still report a completed run, but
    // dependents of the failed artifact are skipped all the same
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(status_of(&result, "enrichment"), ArtifactStatus::Failed);
    assert!(result.artifacts[&id("enrichment")].optional);
    assert_eq!(status_of(&result, "dependent"), ArtifactStatus::Skipped);
    assert_eq!(status_of(&result, "main"), ArtifactStatus::Completed);
}

#[tokio::test]
async fn unavailable_connector_fails_the_artifact() {
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(FakeConnectorFactory::standard("gated").unavailable()));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  src:
    source: {type: gated}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "src"), ArtifactStatus::Failed);
    let error = result.artifacts[&id("src")].error.as_deref().unwrap();
    assert!(error.contains("unavailable"));
}

#[tokio::test]
async fn timeout_of_zero_fails_without_dispatching() {
    let connector = FakeConnectorFactory::standard("ok").with_content(json!([1]));
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(connector.clone()));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
config:
  timeout: 0
artifacts:
  a:
    source: {type: ok}
  b:
    source: {type: ok}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.reason.as_deref(), Some("timeout"));
    assert!(result.artifacts.is_empty(), "nothing reached a terminal state");
    assert_eq!(connector.extract_calls(), 0);

    let metadata = store.load_metadata(&result.run_id).unwrap().unwrap();
    assert_eq!(metadata.status, RunStatus::Failed);
    assert_eq!(metadata.reason.as_deref(), Some("timeout"));
}
