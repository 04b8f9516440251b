// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: dependent skip on failure; independent branches continue.

use crate::prelude::*;
use dm_components::fake::FakeConnectorFactory;
use dm_core::ComponentRegistry;
use dm_engine::{ArtifactStatus, ExecuteOptions};
use dm_storage::{ArtifactStore, RunStatus};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn failed_source_skips_dependent_and_run_reports_failure() {
    let project = Project::new();
    project.write(
        "skip.yaml",
        r#"
name: skip
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

    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("broken").failing("table not found"),
    ));
    registry.register_connector(Arc::new(
        FakeConnectorFactory::standard("ok").with_content(json!([1])),
    ));

    let plan = project.plan_ok(&registry, "skip.yaml");
    let store = project.store();
    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;

    // Exit status indicates failure, but the run was not unwound
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(status_of(&result, "independent"), ArtifactStatus::Completed);
    assert_eq!(status_of(&result, "src"), ArtifactStatus::Failed);
    assert_eq!(status_of(&result, "next"), ArtifactStatus::Skipped);

    // Store has independent only
    assert!(store.exists(&result.run_id, "independent").unwrap());
    assert!(!store.exists(&result.run_id, "src").unwrap());
    assert!(!store.exists(&result.run_id, "next").unwrap());

    let error = result.artifacts[&id("src")].error.as_deref().unwrap();
    assert!(error.contains("table not found"));
}
