// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: child runbook composition end to end.

use crate::prelude::*;
use dm_core::Origin;
use dm_engine::{ArtifactStatus, ExecuteOptions};
use dm_storage::ArtifactStore;

const PARENT: &str = r#"
name: parent
description: Audit with a reusable scan module
artifacts:
  src:
    source:
      type: fs
      properties: {path: /data}
  analysis:
    inputs: src
    child_runbook:
      path: child.yaml
      input_mapping: {source_data: src}
      output: findings
    output: true
"#;

const CHILD: &str = r#"
name: child
description: Reusable personal-data scan
inputs:
  source_data:
    input_schema: standard_input/1.0.0
outputs:
  findings:
    artifact: findings
artifacts:
  validated:
    inputs: source_data
  findings:
    inputs: validated
    process: {type: personal_data}
"#;

#[tokio::test]
async fn flattens_executes_and_labels_child_artifacts() {
    let project = Project::new();
    project.write("parent.yaml", PARENT);
    project.write("child.yaml", CHILD);
    let registry = spec_registry();
    let plan = project.plan_ok(&registry, "parent.yaml");
    let store = project.store();

    // Flattened ids: src plus two namespaced child artifacts
    let ids = plan.ids();
    assert_eq!(ids.len(), 3);
    let validated = ids
        .iter()
        .find(|i| i.as_str().starts_with("child__") && i.as_str().ends_with("__validated"))
        .expect("namespaced validated artifact")
        .clone();
    let findings = ids
        .iter()
        .find(|i| i.as_str().starts_with("child__") && i.as_str().ends_with("__findings"))
        .expect("namespaced findings artifact")
        .clone();

    // Alias: analysis -> the namespaced findings artifact
    assert_eq!(plan.aliases()["analysis"], findings);

    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    assert!(result.is_success());
    assert_eq!(result.completed().len(), 3);

    // All three messages persisted
    for artifact in [id("src"), validated.clone(), findings.clone()] {
        assert!(store.exists(&result.run_id, artifact.as_str()).unwrap());
    }

    // Child artifacts carry their origin; the aliased one carries the
    // parent-facing name
    let validated_result = &result.artifacts[&validated];
    assert_eq!(validated_result.origin, Origin::Child("child".into()));
    assert_eq!(validated_result.alias, None);

    let findings_result = &result.artifacts[&findings];
    assert_eq!(findings_result.origin, Origin::Child("child".into()));
    assert_eq!(findings_result.alias.as_deref(), Some("analysis"));
    assert_eq!(findings_result.status, ArtifactStatus::Completed);
    assert!(findings_result.output, "directive output flag transfers");

    let stored = store.get(&result.run_id, findings.as_str()).unwrap();
    let context = stored.execution().unwrap();
    assert_eq!(context.origin, Origin::Child("child".into()));
    assert_eq!(context.alias.as_deref(), Some("analysis"));

    // Exported outputs use the parent-facing alias
    let outputs = result.export_outputs(plan.as_ref(), store.as_ref()).unwrap();
    assert!(outputs.contains_key("analysis"));
}

#[tokio::test]
async fn same_child_twice_executes_two_disjoint_instances() {
    let project = Project::new();
    project.write(
        "parent.yaml",
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: fs}
  first:
    inputs: src
    child_runbook:
      path: child.yaml
      input_mapping: {source_data: src}
      output: findings
  second:
    inputs: src
    child_runbook:
      path: child.yaml
      input_mapping: {source_data: src}
      output: findings
"#,
    );
    project.write("child.yaml", CHILD);
    let registry = spec_registry();
    let plan = project.plan_ok(&registry, "parent.yaml");
    let store = project.store();

    assert_eq!(plan.ids().len(), 5);
    let first = plan.aliases()["first"].clone();
    let second = plan.aliases()["second"].clone();
    assert_ne!(first, second);

    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    assert!(result.is_success());
    assert_eq!(result.completed().len(), 5);
    assert!(store.exists(&result.run_id, first.as_str()).unwrap());
    assert!(store.exists(&result.run_id, second.as_str()).unwrap());
}
