// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-time validation surfaces: references, components, schemas.

use crate::prelude::*;
use dm_planner::PlanError;
use dm_runbook::ParseError;

#[test]
fn unknown_reference_names_referrer() {
    let project = Project::new();
    project.write(
        "bad.yaml",
        r#"
name: bad
description: t
artifacts:
  src:
    source: {type: fs}
  out:
    inputs: [src, ghost]
"#,
    );
    let err = project.plan(&spec_registry(), "bad.yaml").unwrap_err();
    match err {
        PlanError::MissingArtifact { id, referrer } => {
            assert_eq!(id, "ghost");
            assert_eq!(referrer, "out");
        }
        other => panic!("expected MissingArtifact, got {other}"),
    }
}

#[test]
fn unknown_component_type_is_fatal() {
    let project = Project::new();
    project.write(
        "bad.yaml",
        r#"
name: bad
description: t
artifacts:
  src:
    source: {type: mongodb}
"#,
    );
    let err = project.plan(&spec_registry(), "bad.yaml").unwrap_err();
    assert!(matches!(err, PlanError::ComponentNotFound { .. }));
    assert!(err.to_string().contains("mongodb"));
}

#[test]
fn schema_incompatibility_is_fatal() {
    let project = Project::new();
    project.write(
        "bad.yaml",
        r#"
name: bad
description: t
artifacts:
  src:
    source: {type: fs}
  findings:
    inputs: src
    process: {type: classifier}
  subjects:
    inputs: findings
    process: {type: classifier}
"#,
    );
    // classifier emits finding/1.0.0 but only accepts standard_input/1.0.0
    let err = project.plan(&spec_registry(), "bad.yaml").unwrap_err();
    match err {
        PlanError::SchemaCompatibility { provided, available, .. } => {
            assert!(provided.contains("finding/1.0.0"));
            assert!(available.contains("standard_input/1.0.0"));
        }
        other => panic!("expected SchemaCompatibility, got {other}"),
    }
}

#[test]
fn parse_errors_surface_through_the_planner() {
    let project = Project::new();
    project.write(
        "bad.yaml",
        r#"
name: bad
description: t
artifacts:
  orphan: {}
"#,
    );
    let err = project.plan(&spec_registry(), "bad.yaml").unwrap_err();
    match err {
        PlanError::Parse(ParseError::InvalidFormat { location, .. }) => {
            assert_eq!(location, "artifacts.orphan");
        }
        other => panic!("expected Parse(InvalidFormat), got {other}"),
    }
}

#[test]
fn missing_child_input_mapping_is_fatal() {
    let project = Project::new();
    project.write(
        "parent.yaml",
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: fs}
  run:
    inputs: src
    child_runbook:
      path: child.yaml
      input_mapping: {}
      output: findings
"#,
    );
    project.write(
        "child.yaml",
        r#"
name: child
description: t
inputs:
  source_data:
    input_schema: standard_input/1.0.0
outputs:
  findings:
    artifact: findings
artifacts:
  findings:
    inputs: source_data
    process: {type: personal_data}
"#,
    );
    let err = project.plan(&spec_registry(), "parent.yaml").unwrap_err();
    match err {
        PlanError::MissingInputMapping { missing, .. } => {
            assert_eq!(missing, vec!["source_data"]);
        }
        other => panic!("expected MissingInputMapping, got {other}"),
    }
}
