// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parse → serialise → parse yields a structurally equal model.

use super::parse;

fn assert_roundtrip(text: &str) {
    let first = parse(text);
    let serialized = serde_yaml::to_string(&first).unwrap();
    let second = parse(&serialized);
    assert_eq!(first, second, "roundtrip diverged for:\n{serialized}");
}

#[test]
fn sample_runbook_roundtrips() {
    assert_roundtrip(super::SAMPLE_RUNBOOK);
}

#[test]
fn child_module_roundtrips() {
    assert_roundtrip(
        r#"
name: pii_scan
description: Reusable personal-data scan
inputs:
  source_data:
    input_schema: standard_input/1.0.0
  limit:
    input_schema: config/1.0.0
    optional: true
    default: {max_rows: 50}
    sensitive: true
outputs:
  findings:
    artifact: findings
    description: All findings
artifacts:
  validated:
    inputs: source_data
  findings:
    inputs: [validated, validated]
    process:
      type: personal_data
      properties:
        ruleset: gdpr
    output: true
    optional: true
"#,
    );
}

#[test]
fn parent_with_child_directive_roundtrips() {
    assert_roundtrip(
        r#"
name: parent
description: t
config:
  max_concurrency: 2
  template_paths: [shared]
artifacts:
  src:
    source:
      type: file
      properties: {path: /data}
  prior:
    reuse:
      from_run: 550e8400-e29b-41d4-a716-446655440000
      artifact: findings
  analysis:
    inputs: src
    child_runbook:
      path: pii_scan.yaml
      input_mapping: {source_data: src}
      output: findings
  merged:
    inputs: [analysis, prior]
    output_schema: finding/1.0.0
"#,
    );
}
