// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source -> analyser happy path and same-schema fan-in.

use super::*;
use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_core::{ExecutionStatus, Origin};
use dm_storage::RunStatus;
use serde_json::json;

const SOURCE_THEN_ANALYSER: &str = r#"
name: audit
description: t
artifacts:
  src:
    source: {type: fs, properties: {path: /data}}
  out:
    inputs: src
    process: {type: classifier}
    output: true
"#;

fn registry() -> (ComponentRegistry, FakeConnectorFactory, FakeAnalyserFactory) {
    let connector =
        FakeConnectorFactory::standard("fs").with_content(json!([{"path": "a", "text": "x"}]));
    let analyser = FakeAnalyserFactory::classifier("classifier");
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(connector.clone()));
    registry.register_analyser(Arc::new(analyser.clone()));
    (registry, connector, analyser)
}

#[tokio::test]
async fn source_then_analyser_completes() {
    let (registry, connector, analyser) = registry();
    let plan = plan_with(&registry, SOURCE_THEN_ANALYSER);
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    assert!(result.is_success());
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(status_of(&result, "src"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "out"), ArtifactStatus::Completed);
    assert!(result.failed().is_empty());
    assert!(result.skipped().is_empty());

    assert_eq!(connector.extract_calls(), 1);
    assert_eq!(analyser.calls().len(), 1);
    assert_store_matches(&store, &result);
    assert_partition(&store, &result.run_id, &plan);
}

#[tokio::test]
async fn stored_messages_carry_execution_context() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, SOURCE_THEN_ANALYSER);
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    let message = store.get(&result.run_id, "out").unwrap();
    assert_eq!(message.id, "out");
    assert_eq!(message.schema.to_string(), "finding/1.0.0");
    let context = message.execution().expect("execution context attached");
    assert_eq!(context.status, ExecutionStatus::Success);
    assert_eq!(context.origin, Origin::Parent);
    assert!(context.duration_seconds.is_some());
    assert!(context.error.is_none());
}

#[tokio::test]
async fn analyser_receives_inputs_in_declared_order() {
    let connector_a = FakeConnectorFactory::standard("src_a").with_content(json!([1]));
    let connector_b = FakeConnectorFactory::standard("src_b").with_content(json!([2]));
    let analyser = FakeAnalyserFactory::classifier("classifier");
    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(connector_a));
    registry.register_connector(Arc::new(connector_b));
    registry.register_analyser(Arc::new(analyser.clone()));

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: src_a}
  b:
    source: {type: src_b}
  out:
    inputs: [b, a, b]
    process: {type: classifier}
"#,
    );
    let store = Arc::new(MemoryStore::new());
    run(&registry, &plan, &store).await;

    let calls = analyser.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input_ids, vec!["b", "a", "b"]);
}

#[tokio::test]
async fn fan_in_concatenates_same_schema_contents() {
    let mut registry = ComponentRegistry::new();
    for (name, content) in [("one", json!([1])), ("two", json!([2])), ("three", json!([3]))] {
        registry.register_connector(Arc::new(
            FakeConnectorFactory::standard(name).with_content(content),
        ));
    }

    let plan = plan_with(
        &registry,
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: one}
  b:
    source: {type: two}
  c:
    source: {type: three}
  all:
    inputs: [a, b, c]
    merge: concatenate
    output: true
"#,
    );
    let store = Arc::new(MemoryStore::new());
    let result = run(&registry, &plan, &store).await;

    assert!(result.is_success());
    let merged = store.get(&result.run_id, "all").unwrap();
    assert_eq!(merged.content, json!([1, 2, 3]));
    assert_eq!(merged.schema.to_string(), "standard_input/1.0.0");
}

#[tokio::test]
async fn run_metadata_reaches_completed() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, SOURCE_THEN_ANALYSER);
    let store = Arc::new(MemoryStore::new());

    let result = run(&registry, &plan, &store).await;

    let metadata = store.load_metadata(&result.run_id).unwrap().unwrap();
    assert_eq!(metadata.status, RunStatus::Completed);
    assert!(metadata.end_time.is_some());
    assert_eq!(metadata.runbook_hash.len(), 64);
}

#[tokio::test]
async fn explicit_run_id_is_respected() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, SOURCE_THEN_ANALYSER);
    let store = Arc::new(MemoryStore::new());

    let options = ExecuteOptions {
        run_id: Some(RunId::new("fixed-run")),
        resume_from: None,
    };
    let result = executor(&registry, &plan, &store)
        .execute(options)
        .await
        .unwrap();

    assert_eq!(result.run_id, "fixed-run");
    assert!(store.exists(&RunId::new("fixed-run"), "out").unwrap());
}

#[tokio::test]
async fn deterministic_reruns_yield_identical_outcomes() {
    let (registry, _, _) = registry();
    let plan = plan_with(&registry, SOURCE_THEN_ANALYSER);

    let store_a = Arc::new(MemoryStore::new());
    let store_b = Arc::new(MemoryStore::new());
    let first = run(&registry, &plan, &store_a).await;
    let second = run(&registry, &plan, &store_b).await;

    assert_eq!(first.status, second.status);
    let statuses = |result: &ExecutionResult| {
        result
            .artifacts
            .iter()
            .map(|(id, r)| (id.clone(), r.status))
            .collect::<Vec<_>>()
    };
    assert_eq!(statuses(&first), statuses(&second));
}
