// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: cycles are detected before any artifact executes.

use crate::prelude::*;
use dm_planner::PlanError;

#[tokio::test]
async fn direct_cycle_aborts_planning() {
    let project = Project::new();
    project.write(
        "cycle.yaml",
        r#"
name: cycle
description: t
artifacts:
  x:
    inputs: y
  y:
    inputs: x
"#,
    );
    let registry = spec_registry();

    let err = project.plan(&registry, "cycle.yaml").unwrap_err();
    match err {
        PlanError::Cycle { cycle } => {
            assert!(cycle.contains(&"x".to_string()));
            assert!(cycle.contains(&"y".to_string()));
        }
        other => panic!("expected Cycle, got {other}"),
    }

    // The executor was never invoked: nothing was stored
    let runs_dir = project.dir.path().join("state").join("runs");
    assert!(!runs_dir.exists());
}

#[test]
fn indirect_cycle_through_a_chain_is_detected() {
    let project = Project::new();
    project.write(
        "cycle.yaml",
        r#"
name: cycle
description: t
artifacts:
  a:
    inputs: c
  b:
    inputs: a
  c:
    inputs: b
  standalone:
    source: {type: fs}
"#,
    );
    let registry = spec_registry();
    let err = project.plan(&registry, "cycle.yaml").unwrap_err();
    assert!(matches!(err, PlanError::Cycle { .. }));
}
