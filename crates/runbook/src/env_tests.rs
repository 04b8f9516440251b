// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
#[serial(env)]
fn substitutes_in_nested_strings() {
    std::env::set_var("DM_TEST_HOST", "db.internal");
    let value = yaml(
        r#"
source:
  type: mysql
  properties:
    host: "${DM_TEST_HOST}"
    port: 3306
"#,
    );
    let out = substitute_env(value).unwrap();
    assert_eq!(
        out["source"]["properties"]["host"],
        Value::String("db.internal".into())
    );
    std::env::remove_var("DM_TEST_HOST");
}

#[test]
#[serial(env)]
fn substitutes_multiple_occurrences_in_one_string() {
    std::env::set_var("DM_TEST_A", "x");
    std::env::set_var("DM_TEST_B", "y");
    let out = substitute_env(Value::String("${DM_TEST_A}-${DM_TEST_B}-${DM_TEST_A}".into()));
    assert_eq!(out.unwrap(), Value::String("x-y-x".into()));
    std::env::remove_var("DM_TEST_A");
    std::env::remove_var("DM_TEST_B");
}

#[test]
#[serial(env)]
fn missing_variable_names_the_variable() {
    std::env::remove_var("DM_TEST_ABSENT");
    let err = substitute_env(Value::String("${DM_TEST_ABSENT}".into())).unwrap_err();
    assert_eq!(err, "DM_TEST_ABSENT");
}

#[test]
fn non_string_values_pass_through() {
    let value = yaml("{count: 3, ratio: 1.5, on: true, nothing: null}");
    let out = substitute_env(value.clone()).unwrap();
    assert_eq!(out, value);
}

#[test]
fn plain_dollar_is_left_alone() {
    let out = substitute_env(Value::String("cost is $100, ${not a var}".into())).unwrap();
    assert_eq!(out, Value::String("cost is $100, ${not a var}".into()));
}

#[test]
#[serial(env)]
fn substitutes_in_sequences_and_keys() {
    std::env::set_var("DM_TEST_KEY", "prod");
    let value = yaml(
        r#"
"${DM_TEST_KEY}_paths":
  - "a/${DM_TEST_KEY}"
  - plain
"#,
    );
    let out = substitute_env(value).unwrap();
    assert_eq!(out["prod_paths"][0], Value::String("a/prod".into()));
    assert_eq!(out["prod_paths"][1], Value::String("plain".into()));
    std::env::remove_var("DM_TEST_KEY");
}
