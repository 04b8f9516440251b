// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sensitive child inputs are redacted in exports, while the consuming
//! analyser still receives the real content.

use crate::prelude::*;
use dm_components::fake::{FakeAnalyserFactory, FakeConnectorFactory};
use dm_core::{ComponentRegistry, InputRequirement, Schema};
use dm_engine::ExecuteOptions;
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn sensitive_binding_is_redacted_in_exports_only() {
    let project = Project::new();
    project.write(
        "parent.yaml",
        r#"
name: parent
description: t
artifacts:
  creds:
    source: {type: vault}
    output: true
  scan:
    inputs: creds
    child_runbook:
      path: secret.yaml
      input_mapping: {credentials: creds}
      output: report
    output: true
"#,
    );
    project.write(
        "secret.yaml",
        r#"
name: secret
description: t
inputs:
  credentials:
    input_schema: credential/1.0.0
    sensitive: true
outputs:
  report:
    artifact: report
artifacts:
  report:
    inputs: credentials
    process: {type: authenticated_scan}
"#,
    );

    let mut registry = ComponentRegistry::new();
    registry.register_connector(Arc::new(
        FakeConnectorFactory::new("vault", Schema::new("credential", "1.0.0"))
            .with_content(json!({"token": "s3cr3t"})),
    ));
    let analyser = FakeAnalyserFactory::new(
        "authenticated_scan",
        vec![vec![InputRequirement::new("credential", "1.0.0")]],
        Schema::new("finding", "1.0.0"),
    );
    registry.register_analyser(Arc::new(analyser.clone()));

    let plan = project.plan_ok(&registry, "parent.yaml");
    assert!(plan.is_redacted(&id("creds")));

    let store = project.store();
    let result = execute(&registry, &plan, &store, ExecuteOptions::new()).await;
    assert!(result.is_success());

    // The analyser saw the real token
    assert_eq!(analyser.calls().len(), 1);

    // Exports replace the sensitive content
    let outputs = result.export_outputs(plan.as_ref(), store.as_ref()).unwrap();
    assert_eq!(outputs["creds"], Value::String("[REDACTED]".into()));

    // The child's report itself is not redacted
    let report = outputs
        .get("scan")
        .expect("aliased child output exported");
    assert_ne!(report, &Value::String("[REDACTED]".into()));
}
