// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production-method exclusivity: exactly one of source/inputs/reuse.

use super::{assert_err_contains, parse, parse_err};
use crate::{ParseError, Production};

#[test]
fn source_artifact() {
    let runbook = parse(
        r#"
name: t
description: t
artifacts:
  src:
    source:
      type: mysql
      properties:
        host: db.internal
"#,
    );
    let def = &runbook.artifacts["src"];
    assert!(def.is_source());
    match &def.production {
        Production::Source(source) => {
            assert_eq!(source.connector, "mysql");
            assert_eq!(source.properties["host"], "db.internal");
        }
        other => panic!("expected source production, got {other:?}"),
    }
}

#[test]
fn inputs_accepts_bare_string() {
    let runbook = parse(
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: file}
  b:
    inputs: a
"#,
    );
    assert_eq!(runbook.artifacts["b"].inputs(), ["a"]);
}

#[test]
fn inputs_accepts_list_and_preserves_order_and_multiplicity() {
    let runbook = parse(
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: file}
  b:
    source: {type: file}
  all:
    inputs: [b, a, b]
"#,
    );
    assert_eq!(runbook.artifacts["all"].inputs(), ["b", "a", "b"]);
}

#[test]
fn reuse_artifact() {
    let runbook = parse(
        r#"
name: t
description: t
artifacts:
  prior:
    reuse:
      from_run: 550e8400-e29b-41d4-a716-446655440000
      artifact: findings
"#,
    );
    let def = &runbook.artifacts["prior"];
    assert!(def.is_reuse());
    match &def.production {
        Production::Reuse(reuse) => assert_eq!(reuse.artifact, "findings"),
        other => panic!("expected reuse production, got {other:?}"),
    }
}

#[test]
fn missing_production_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  orphan:
    description: no production method
"#,
    );
    assert!(matches!(err, ParseError::InvalidFormat { .. }));
    assert_err_contains(&err, &["artifacts.orphan", "exactly one"]);
}

#[test]
fn source_and_inputs_together_are_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  both:
    source: {type: file}
    inputs: [x]
"#,
    );
    assert_err_contains(&err, &["artifacts.both", "exactly one"]);
}

#[test]
fn source_and_reuse_together_are_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  both:
    source: {type: file}
    reuse: {from_run: r, artifact: a}
"#,
    );
    assert_err_contains(&err, &["exactly one"]);
}

#[test]
fn empty_inputs_list_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  empty:
    inputs: []
"#,
    );
    assert_err_contains(&err, &["artifacts.empty", "must not be empty"]);
}

#[test]
fn process_on_source_artifact_is_allowed() {
    // A connector followed by an inline analyser on the same artifact is
    // not part of the model; process applies to derived artifacts, but the
    // parser only forbids process alongside child_runbook. Schema rules
    // are the planner's concern.
    let runbook = parse(
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: file}
  scan:
    inputs: a
    process:
      type: regex_scan
"#,
    );
    assert!(runbook.artifacts["scan"].process.is_some());
}

#[test]
fn unknown_artifact_field_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  a:
    source: {type: file}
    retries: 3
"#,
    );
    assert!(matches!(err, ParseError::Yaml(_)));
    assert!(err.to_string().contains("retries"));
}
