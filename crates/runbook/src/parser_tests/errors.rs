// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parse error surfaces: malformed YAML, missing env vars, missing fields.

use super::parse_err;
use crate::{parse_runbook, parse_runbook_str, ParseError};
use serial_test::serial;

#[test]
fn malformed_yaml_reports_location() {
    let err = parse_err("name: [unclosed");
    assert!(matches!(err, ParseError::Yaml(_)));
}

#[test]
fn missing_name_is_rejected() {
    let err = parse_err("description: only\nartifacts: {}\n");
    assert!(matches!(err, ParseError::Yaml(_)));
    assert!(err.to_string().contains("name"));
}

#[test]
fn missing_description_is_rejected() {
    let err = parse_err("name: only\nartifacts: {}\n");
    assert!(err.to_string().contains("description"));
}

#[test]
fn unknown_top_level_field_is_rejected() {
    let err = parse_err(
        r#"
name: t
description: t
pipelines: {}
"#,
    );
    assert!(err.to_string().contains("pipelines"));
}

#[test]
#[serial(env)]
fn missing_env_var_names_the_variable() {
    std::env::remove_var("DM_TEST_DB_HOST");
    let err = parse_err(
        r#"
name: t
description: t
artifacts:
  src:
    source:
      type: mysql
      properties:
        host: "${DM_TEST_DB_HOST}"
"#,
    );
    match err {
        ParseError::MissingEnvVar { name } => assert_eq!(name, "DM_TEST_DB_HOST"),
        other => panic!("expected MissingEnvVar, got {other}"),
    }
}

#[test]
#[serial(env)]
fn env_vars_substitute_into_properties() {
    std::env::set_var("DM_TEST_DB_HOST", "db.internal");
    let runbook = parse_runbook_str(
        r#"
name: t
description: t
artifacts:
  src:
    source:
      type: mysql
      properties:
        host: "${DM_TEST_DB_HOST}"
"#,
    )
    .unwrap();
    match &runbook.artifacts["src"].production {
        crate::Production::Source(source) => {
            assert_eq!(source.properties["host"], "db.internal");
        }
        other => panic!("expected source, got {other:?}"),
    }
    std::env::remove_var("DM_TEST_DB_HOST");
}

#[test]
fn unreadable_file_reports_path() {
    let err = parse_runbook(std::path::Path::new("/nonexistent/runbook.yaml")).unwrap_err();
    match err {
        ParseError::Io { ref path, .. } => assert!(path.contains("runbook.yaml")),
        other => panic!("expected Io error, got {other}"),
    }
}

#[test]
fn file_parse_matches_str_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.yaml");
    std::fs::write(&path, super::SAMPLE_RUNBOOK).unwrap();

    let from_file = parse_runbook(&path).unwrap();
    let from_str = parse_runbook_str(super::SAMPLE_RUNBOOK).unwrap();
    assert_eq!(from_file, from_str);
}
