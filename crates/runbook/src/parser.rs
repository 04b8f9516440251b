// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook parsing (YAML)
//!
//! Parsing is pure over (file bytes, environment snapshot): read YAML,
//! substitute `${VAR}` from the environment, build the strict typed model,
//! then enforce the cross-field invariants with locations that name the
//! offending entry.

use crate::env::substitute_env;
use crate::model::{
    ArtifactDefinition, InputDeclaration, OutputDeclaration, Production, Runbook, RunbookConfig,
};
use indexmap::IndexMap;
use regex::Regex;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur during runbook parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("invalid format for {location}: {message}")]
    InvalidFormat { location: String, message: String },
}

/// Artifact ids and declared input/output names. The first character is
/// alphanumeric so post-flatten ids never collide with the reserved
/// `_system` store directory.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("constant regex pattern is valid")
});

/// Raw artifact shape as authored: the three production fields are all
/// optional here; exclusivity is enforced when building the model.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArtifact {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    source: Option<crate::model::SourceConfig>,
    #[serde(default, deserialize_with = "one_or_many")]
    inputs: Option<Vec<String>>,
    #[serde(default)]
    reuse: Option<crate::model::ReuseConfig>,
    #[serde(default)]
    process: Option<crate::model::ProcessConfig>,
    #[serde(default)]
    child_runbook: Option<crate::model::ChildRunbookConfig>,
    #[serde(default)]
    merge: Option<crate::model::MergeStrategy>,
    #[serde(default)]
    output_schema: Option<dm_core::Schema>,
    #[serde(default)]
    output: bool,
    #[serde(default)]
    optional: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRunbook {
    name: String,
    description: String,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    config: RunbookConfig,
    #[serde(default)]
    inputs: IndexMap<String, InputDeclaration>,
    #[serde(default)]
    outputs: IndexMap<String, OutputDeclaration>,
    #[serde(default)]
    artifacts: IndexMap<String, RawArtifact>,
}

/// Parse a runbook file
pub fn parse_runbook(path: &Path) -> Result<Runbook, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_runbook_str(&content)
}

/// Parse a runbook from YAML content
pub fn parse_runbook_str(content: &str) -> Result<Runbook, ParseError> {
    // 1. YAML parse
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;

    // 2. Environment substitution
    let value = substitute_env(value).map_err(|name| ParseError::MissingEnvVar { name })?;

    // 3. Serde does the heavy lifting (unknown fields rejected)
    let raw: RawRunbook = serde_yaml::from_value(value)?;

    build_runbook(raw)
}

fn build_runbook(raw: RawRunbook) -> Result<Runbook, ParseError> {
    // 4. Identifier charset
    validate_id(&raw.name, "name")?;
    for id in raw.artifacts.keys() {
        validate_id(id, &format!("artifacts.{}", id))?;
    }
    for name in raw.inputs.keys() {
        validate_id(name, &format!("inputs.{}", name))?;
    }
    for name in raw.outputs.keys() {
        validate_id(name, &format!("outputs.{}", name))?;
    }

    // 5. Config sanity
    if raw.config.max_concurrency == 0 {
        return Err(ParseError::InvalidFormat {
            location: "config.max_concurrency".to_string(),
            message: "max_concurrency must be >= 1".to_string(),
        });
    }

    // 6. Input declarations: a default value requires optional
    for (name, declaration) in &raw.inputs {
        if declaration.default.is_some() && !declaration.optional {
            return Err(ParseError::InvalidFormat {
                location: format!("inputs.{}", name),
                message: "a default value requires optional: true".to_string(),
            });
        }
    }

    // 7. Outputs must reference artifacts defined in this runbook
    for (name, declaration) in &raw.outputs {
        if !raw.artifacts.contains_key(&declaration.artifact) {
            return Err(ParseError::InvalidFormat {
                location: format!("outputs.{}", name),
                message: format!(
                    "references unknown artifact '{}'; available artifacts: {}",
                    declaration.artifact,
                    sorted_keys(&raw.artifacts),
                ),
            });
        }
    }

    // 8. Artifact conversion: production exclusivity and processing rules
    let mut artifacts = IndexMap::with_capacity(raw.artifacts.len());
    for (id, artifact) in raw.artifacts {
        let definition = convert_artifact(&id, artifact)?;
        artifacts.insert(id, definition);
    }

    // 9. A runbook declaring top-level inputs is a reusable module and
    //    must not extract from external systems itself
    if !raw.inputs.is_empty() {
        for (id, definition) in &artifacts {
            if definition.is_source() {
                return Err(ParseError::InvalidFormat {
                    location: format!("artifacts.{}", id),
                    message: "a runbook with declared inputs must not contain 'source' artifacts"
                        .to_string(),
                });
            }
        }
    }

    // 10. output_mapping exposed names become artifact references after
    //     flattening and must not shadow an artifact defined here
    for (id, definition) in &artifacts {
        if let Some(ref child) = definition.child_runbook {
            for exposed in child.output_mapping.iter().flatten().map(|(_, name)| name) {
                if artifacts.contains_key(exposed) {
                    return Err(ParseError::InvalidFormat {
                        location: format!("artifacts.{}.child_runbook.output_mapping", id),
                        message: format!(
                            "exposed name '{}' collides with an artifact defined in this runbook",
                            exposed
                        ),
                    });
                }
            }
        }
    }

    Ok(Runbook {
        name: raw.name,
        description: raw.description,
        contact: raw.contact,
        config: raw.config,
        inputs: raw.inputs,
        outputs: raw.outputs,
        artifacts,
    })
}

fn convert_artifact(id: &str, raw: RawArtifact) -> Result<ArtifactDefinition, ParseError> {
    let location = format!("artifacts.{}", id);
    let invalid = |message: String| ParseError::InvalidFormat {
        location: location.clone(),
        message,
    };

    let production = match (raw.source, raw.inputs, raw.reuse) {
        (Some(source), None, None) => Production::Source(source),
        (None, Some(inputs), None) => {
            if inputs.is_empty() {
                return Err(invalid("'inputs' must not be empty".to_string()));
            }
            for reference in &inputs {
                if !ID_PATTERN.is_match(reference) {
                    return Err(invalid(format!(
                        "input reference '{}' is not a valid identifier",
                        reference
                    )));
                }
            }
            Production::Inputs(inputs)
        }
        (None, None, Some(reuse)) => Production::Reuse(reuse),
        _ => {
            return Err(invalid(
                "exactly one of 'source', 'inputs', or 'reuse' is required".to_string(),
            ))
        }
    };

    if raw.process.is_some() && raw.child_runbook.is_some() {
        return Err(invalid(
            "'process' and 'child_runbook' are mutually exclusive".to_string(),
        ));
    }

    if let Some(ref child) = raw.child_runbook {
        if !matches!(production, Production::Inputs(_)) {
            return Err(invalid("'child_runbook' requires 'inputs'".to_string()));
        }
        match (&child.output, &child.output_mapping) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(invalid(
                    "'child_runbook' requires exactly one of 'output' or 'output_mapping'"
                        .to_string(),
                ))
            }
        }
        if child.output_mapping.as_ref().is_some_and(|m| m.is_empty()) {
            return Err(invalid("'output_mapping' must not be empty".to_string()));
        }
        for (name, reference) in &child.input_mapping {
            for value in [name, reference] {
                if !ID_PATTERN.is_match(value) {
                    return Err(invalid(format!(
                        "input_mapping entry '{}' is not a valid identifier",
                        value
                    )));
                }
            }
        }
        for (name, exposed) in child.output_mapping.iter().flatten() {
            for value in [name, exposed] {
                if !ID_PATTERN.is_match(value) {
                    return Err(invalid(format!(
                        "output_mapping entry '{}' is not a valid identifier",
                        value
                    )));
                }
            }
        }
    }

    Ok(ArtifactDefinition {
        name: raw.name,
        description: raw.description,
        contact: raw.contact,
        production,
        process: raw.process,
        child_runbook: raw.child_runbook,
        merge: raw.merge.unwrap_or_default(),
        output_schema: raw.output_schema,
        output: raw.output,
        optional: raw.optional,
    })
}

fn validate_id(id: &str, location: &str) -> Result<(), ParseError> {
    if ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(ParseError::InvalidFormat {
            location: location.to_string(),
            message: format!(
                "'{}' is not a valid identifier (expected [A-Za-z0-9][A-Za-z0-9_.-]*)",
                id
            ),
        })
    }
}

fn sorted_keys<V>(map: &IndexMap<String, V>) -> String {
    let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    keys.join(", ")
}

/// Deserialize `inputs` from either a bare string or a sequence.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OneOrMany;

    impl<'de> Visitor<'de> for OneOrMany {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an artifact id or a sequence of artifact ids")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S: SeqAccess<'de>>(self, seq: S) -> Result<Self::Value, S::Error> {
            Vec::deserialize(de::value::SeqAccessDeserializer::new(seq))
        }
    }

    deserializer.deserialize_any(OneOrMany).map(Some)
}

#[cfg(test)]
#[path = "parser_tests/mod.rs"]
mod tests;
