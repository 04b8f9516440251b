// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-runbook directive structure and the reusable-module rule.

use super::{assert_err_contains, parse, parse_err};

#[test]
fn child_runbook_with_single_output() {
    let runbook = parse(
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: file}
  analysis:
    inputs: src
    child_runbook:
      path: pii_scan.yaml
      input_mapping:
        source_data: src
      output: findings
"#,
    );
    let child = runbook.artifacts["analysis"].child_runbook.as_ref().unwrap();
    assert_eq!(child.path, "pii_scan.yaml");
    assert_eq!(child.input_mapping["source_data"], "src");
    assert_eq!(child.output.as_deref(), Some("findings"));
}

#[test]
fn child_runbook_with_output_mapping() {
    let runbook = parse(
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: file}
  analysis:
    inputs: src
    child_runbook:
      path: pii_scan.yaml
      input_mapping: {source_data: src}
      output_mapping:
        findings: pii_findings
        subjects: pii_subjects
"#,
    );
    let child = runbook.artifacts["analysis"].child_runbook.as_ref().unwrap();
    let mapping = child.output_mapping.as_ref().unwrap();
    assert_eq!(mapping["findings"], "pii_findings");
    assert_eq!(mapping["subjects"], "pii_subjects");
}

#[test]
fn child_runbook_requires_inputs() {
    let err = parse_err(
        r#"
name: parent
description: t
artifacts:
  analysis:
    source: {type: file}
    child_runbook:
      path: pii_scan.yaml
      output: findings
"#,
    );
    assert_err_contains(&err, &["artifacts.analysis", "requires 'inputs'"]);
}

#[test]
fn child_runbook_forbids_process() {
    let err = parse_err(
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: file}
  analysis:
    inputs: src
    process: {type: regex_scan}
    child_runbook:
      path: pii_scan.yaml
      output: findings
"#,
    );
    assert_err_contains(&err, &["mutually exclusive"]);
}

#[test]
fn output_and_output_mapping_are_exclusive() {
    let err = parse_err(
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: file}
  analysis:
    inputs: src
    child_runbook:
      path: pii_scan.yaml
      output: findings
      output_mapping: {findings: f}
"#,
    );
    assert_err_contains(&err, &["exactly one of 'output' or 'output_mapping'"]);
}

#[test]
fn one_of_output_forms_is_required() {
    let err = parse_err(
        r#"
name: parent
description: t
artifacts:
  src:
    source: {type: file}
  analysis:
    inputs: src
    child_runbook:
      path: pii_scan.yaml
"#,
    );
    assert_err_contains(&err, &["exactly one of 'output' or 'output_mapping'"]);
}

#[test]
fn reusable_module_must_not_contain_sources() {
    let err = parse_err(
        r#"
name: pii_scan
description: t
inputs:
  source_data:
    input_schema: standard_input/1.0.0
artifacts:
  extra:
    source: {type: file}
  validated:
    inputs: source_data
"#,
    );
    assert_err_contains(&err, &["artifacts.extra", "must not contain 'source'"]);
}

#[test]
fn reusable_module_with_derived_artifacts_parses() {
    let runbook = parse(
        r#"
name: pii_scan
description: t
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
"#,
    );
    assert!(runbook.is_child_module());
    assert_eq!(runbook.outputs["findings"].artifact, "findings");
}
