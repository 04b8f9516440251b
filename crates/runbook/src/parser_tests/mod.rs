// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{parse_runbook_str, ParseError, Runbook};

mod child;
mod declarations;
mod errors;
mod production;
mod roundtrip;

pub(crate) const SAMPLE_RUNBOOK: &str = r#"
name: customer_audit
description: Locate personal data in customer systems
contact: privacy@example.com
config:
  max_concurrency: 4
  timeout: 600
artifacts:
  src:
    source:
      type: file
      properties:
        path: /data/export
  findings:
    description: Personal data findings
    inputs: src
    process:
      type: regex_scan
      properties:
        patterns:
          email: "[a-z]+@[a-z]+"
    output: true
"#;

pub(crate) fn parse(text: &str) -> Runbook {
    match parse_runbook_str(text) {
        Ok(runbook) => runbook,
        Err(err) => panic!("expected runbook to parse, got: {err}"),
    }
}

pub(crate) fn parse_err(text: &str) -> ParseError {
    match parse_runbook_str(text) {
        Ok(_) => panic!("expected parse to fail"),
        Err(err) => err,
    }
}

pub(crate) fn assert_err_contains(err: &ParseError, needles: &[&str]) {
    let text = err.to_string();
    for needle in needles {
        assert!(
            text.contains(needle),
            "expected error to mention '{needle}', got: {text}"
        );
    }
}

#[test]
fn sample_runbook_parses() {
    let runbook = parse(SAMPLE_RUNBOOK);
    assert_eq!(runbook.name, "customer_audit");
    assert_eq!(runbook.config.max_concurrency, 4);
    assert_eq!(runbook.config.timeout, Some(600));
    assert_eq!(runbook.artifacts.len(), 2);
    assert!(runbook.artifacts["findings"].output);
}

#[test]
fn artifact_order_is_preserved() {
    let runbook = parse(SAMPLE_RUNBOOK);
    let ids: Vec<&str> = runbook.artifacts.keys().map(|k| k.as_str()).collect();
    assert_eq!(ids, vec!["src", "findings"]);
}

#[test]
fn defaults_apply_when_config_absent() {
    let runbook = parse(
        r#"
name: minimal
description: Bare minimum
artifacts: {}
"#,
    );
    assert_eq!(runbook.config.max_concurrency, 10);
    assert_eq!(runbook.config.timeout, None);
    assert!(runbook.config.template_paths.is_empty());
    assert!(!runbook.is_child_module());
}
