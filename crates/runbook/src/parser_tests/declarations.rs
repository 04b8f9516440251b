// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level input/output declarations and config validation.

use super::{assert_err_contains, parse, parse_err};
use serde_json::json;
use yare::parameterized;

#[test]
fn input_declaration_fields() {
    let runbook = parse(
        r#"
name: pii_scan
description: t
inputs:
  source_data:
    input_schema: standard_input/1.0.0
    description: Extracted records to scan
  api_token:
    input_schema: credential/1.0.0
    optional: true
    sensitive: true
artifacts: {}
"#,
    );
    let data = &runbook.inputs["source_data"];
    assert_eq!(data.input_schema.to_string(), "standard_input/1.0.0");
    assert!(!data.optional);
    assert!(!data.sensitive);

    let token = &runbook.inputs["api_token"];
    assert!(token.optional);
    assert!(token.sensitive);
}

#[test]
fn default_requires_optional() {
    let err = parse_err(
        r#"
name: t
description: t
inputs:
  limit:
    input_schema: config/1.0.0
    default: 100
artifacts: {}
"#,
    );
    assert_err_contains(&err, &["inputs.limit", "requires optional: true"]);
}

#[test]
fn optional_default_is_carried() {
    let runbook = parse(
        r#"
name: t
description: t
inputs:
  limit:
    input_schema: config/1.0.0
    optional: true
    default: {max_rows: 100}
artifacts: {}
"#,
    );
    let declared = runbook.inputs["limit"].default.as_ref().unwrap();
    assert_eq!(declared, &json!({"max_rows": 100}));
}

#[test]
fn malformed_input_schema_reference_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
inputs:
  data:
    input_schema: standard_input
artifacts: {}
"#,
    );
    assert!(err.to_string().contains("name/version"));
}

#[test]
fn outputs_must_reference_defined_artifacts() {
    let err = parse_err(
        r#"
name: t
description: t
outputs:
  findings:
    artifact: nope
artifacts:
  real:
    source: {type: file}
"#,
    );
    assert_err_contains(&err, &["outputs.findings", "unknown artifact 'nope'", "real"]);
}

#[test]
fn zero_max_concurrency_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
config:
  max_concurrency: 0
artifacts: {}
"#,
    );
    assert_err_contains(&err, &["config.max_concurrency", ">= 1"]);
}

#[test]
fn template_paths_are_carried() {
    let runbook = parse(
        r#"
name: t
description: t
config:
  template_paths: [shared, ../library]
artifacts: {}
"#,
    );
    assert_eq!(runbook.config.template_paths, vec!["shared", "../library"]);
}

#[parameterized(
    underscore_prefix = { "_system" },
    dot_prefix = { ".hidden" },
    spaces = { "my artifact" },
    slash = { "a/b" },
    empty = { "" },
)]
fn invalid_artifact_ids_are_rejected(id: &str) {
    let err = parse_err(&format!(
        r#"
name: t
description: t
artifacts:
  "{id}":
    source: {{type: file}}
"#
    ));
    assert_err_contains(&err, &["not a valid identifier"]);
}
