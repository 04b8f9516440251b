// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-run artifact reuse.

use super::*;
use dm_components::fake::FakeAnalyserFactory;
use dm_core::test_support::message;
use dm_core::{ExecutionStatus, InputRequirement, Schema};
use serde_json::json;

fn seed_prior_findings(store: &MemoryStore) {
    let prior = message("findings", "finding", "1.0.0", json!([{"kind": "email"}]));
    store.save(&RunId::new("prior-run"), "findings", &prior).unwrap();
}

#[tokio::test]
async fn reuse_copies_the_stored_message_into_this_run() {
    let registry = ComponentRegistry::new();
    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: prior-run
      artifact: findings
    output: true
"#,
    );
    let store = Arc::new(MemoryStore::new());
    seed_prior_findings(&store);

    let result = run(&registry, &plan, &store).await;

    assert!(result.is_success());
    let copied = store.get(&result.run_id, "prior").unwrap();
    assert_eq!(copied.id, "prior");
    assert_eq!(copied.content, json!([{"kind": "email"}]));
    assert_eq!(copied.schema.to_string(), "finding/1.0.0");
    assert_eq!(
        copied.execution().unwrap().status,
        ExecutionStatus::Success
    );

    // The source run's copy is untouched
    assert!(store.exists(&RunId::new("prior-run"), "findings").unwrap());
}

#[tokio::test]
async fn reused_message_feeds_downstream_analysers() {
    let analyser = FakeAnalyserFactory::new(
        "subject_classifier",
        vec![vec![InputRequirement::new("finding", "1.0.0")]],
        Schema::new("subject", "1.0.0"),
    );
    let mut registry = ComponentRegistry::new();
    registry.register_analyser(Arc::new(analyser.clone()));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: prior-run
      artifact: findings
  subjects:
    inputs: prior
    process: {type: subject_classifier}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    seed_prior_findings(&store);

    let result = run(&registry, &plan, &store).await;

    // The requirement match was deferred at plan time and passed at
    // execution against the stored schema
    assert!(result.is_success());
    assert_eq!(analyser.calls().len(), 1);
}

#[tokio::test]
async fn reused_schema_mismatch_fails_the_consumer() {
    let analyser = FakeAnalyserFactory::classifier("classifier");
    let mut registry = ComponentRegistry::new();
    registry.register_analyser(Arc::new(analyser));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: prior-run
      artifact: findings
  out:
    inputs: prior
    process: {type: classifier}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    seed_prior_findings(&store);

    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "prior"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "out"), ArtifactStatus::Failed);
    let error = result.artifacts[&id("out")].error.as_deref().unwrap();
    assert!(error.contains("schema mismatch"));
    assert!(error.contains("finding/1.0.0"));
}

#[tokio::test]
async fn reuse_override_verifies_the_stored_schema() {
    let registry = ComponentRegistry::new();
    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: prior-run
      artifact: findings
    output_schema: standard_input/1.0.0
"#,
    );
    let store = Arc::new(MemoryStore::new());
    seed_prior_findings(&store);

    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "prior"), ArtifactStatus::Failed);
    let error = result.artifacts[&id("prior")].error.as_deref().unwrap();
    assert!(error.contains("declared standard_input/1.0.0"));
}

#[tokio::test]
async fn missing_reused_artifact_fails_and_skips_dependents() {
    let registry = ComponentRegistry::new();
    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: prior-run
      artifact: absent
  downstream:
    inputs: prior
"#,
    );
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    assert_eq!(status_of(&result, "prior"), ArtifactStatus::Failed);
    assert_eq!(status_of(&result, "downstream"), ArtifactStatus::Skipped);
    let error = result.artifacts[&id("prior")].error.as_deref().unwrap();
    assert!(error.contains("not found"));
}
