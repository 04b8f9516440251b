// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable substitution over the YAML value tree
//!
//! Every `${VAR}` occurrence in any string (mapping keys included) is
//! replaced from the process environment before the typed model is built.
//! A missing variable is an error, never silently left in place.

use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

/// Regex pattern for ${VARIABLE_NAME}
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static ENV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("constant regex pattern is valid")
});

/// Substitute `${VAR}` in every string of the value tree.
///
/// Returns the name of the first missing variable as the error.
pub fn substitute_env(value: Value) -> Result<Value, String> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_str(&s)?)),
        Value::Sequence(items) => items
            .into_iter()
            .map(substitute_env)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(mapping) => {
            let mut out = serde_yaml::Mapping::with_capacity(mapping.len());
            for (key, val) in mapping {
                out.insert(substitute_env(key)?, substitute_env(val)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Tagged(tagged) => {
            let serde_yaml::value::TaggedValue { tag, value } = *tagged;
            Ok(Value::Tagged(Box::new(serde_yaml::value::TaggedValue {
                tag,
                value: substitute_env(value)?,
            })))
        }
        other => Ok(other),
    }
}

fn substitute_str(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for captures in ENV_PATTERN.captures_iter(input) {
        // Capture 0 always exists when the pattern matched
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let name = &captures[1];
        out.push_str(&input[last..whole.start()]);
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => return Err(name.to_string()),
        }
        last = whole.end();
    }
    out.push_str(&input[last..]);
    Ok(out)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
