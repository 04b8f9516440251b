// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: same-schema fan-in with concatenate merge.

use crate::prelude::*;
use dm_components::fake::FakeConnectorFactory;
use dm_core::ComponentRegistry;
use dm_engine::ExecuteOptions;
use dm_storage::ArtifactStore;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn three_sources_concatenate() {
    let project = Project::new();
    project.write(
        "fan_in.yaml",
        r#"
name: fan_in
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

    let mut registry = ComponentRegistry::new();
    for (name, content) in [
        ("one", json!([{"n": 1}])),
        ("two", json!([{"n": 2}])),
        ("three", json!([{"n": 3}])),
    ] {
        registry.register_connector(Arc::new(
            FakeConnectorFactory::standard(name).with_content(content),
        ));
    }

    let plan = project.plan_ok(&registry, "fan_in.yaml");
    let store = project.store();
    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;

    assert!(result.is_success());
    let merged = store.get(&result.run_id, "all").unwrap();
    assert_eq!(merged.content, json!([{"n": 1}, {"n": 2}, {"n": 3}]));
    // Schema unchanged by the merge
    assert_eq!(merged.schema.to_string(), "standard_input/1.0.0");
}
